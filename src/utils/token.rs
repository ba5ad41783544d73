use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Random lowercase alphanumeric string, used to disambiguate placeholder slugs.
pub fn random_suffix(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_lowercase_alphanumeric() {
        let suffix = random_suffix(12);
        assert_eq!(suffix.len(), 12);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
