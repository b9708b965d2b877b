use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PenError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(PenError::shader("x").to_string().contains("shader error:"));
    assert!(
        PenError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PenError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
