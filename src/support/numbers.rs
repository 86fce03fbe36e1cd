pub fn count_noun(n: u64, noun: &str) -> String {
    match n {
        1 => format!("1 {}", noun),
        _ => format!("{} {}s", n, noun),
    }
}
