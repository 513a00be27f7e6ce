/// Render names as a spoken-style list: `"Red"`, `"Red, and Blue"`,
/// `"Red, Green, and Blue"`. Duplicates are kept; an empty list gives `""`.
pub fn enumerate_names<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [head @ .., last] => {
            let mut out = head
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<&str>>()
                .join(", ");
            out.push_str(", and ");
            out.push_str(last.as_ref());
            out
        }
    }
}
