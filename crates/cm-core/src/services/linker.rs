use regex::Regex;
use std::sync::LazyLock;

use crate::error::LinkError;
use crate::models::artifact::PLACEHOLDER_WIDTH;
use crate::models::Artifact;

// A placeholder occupies exactly the width of a hex-encoded address, so
// matches are fixed-width and adjacent placeholders cannot run together.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__[A-Za-z0-9$.:_-]{38}").unwrap());

/// Substitute `library`'s deployed address for its placeholder in the
/// dependent artifact's bytecode, returning the rewritten bytecode.
/// Every occurrence is replaced.
pub fn link_into(dependent: &Artifact, library: &str, address: &str) -> Result<String, LinkError> {
    let addr = normalize_address(address)?;
    let placeholder = Artifact::placeholder(library);

    if !dependent.bytecode.contains(&placeholder) {
        return Err(LinkError::PlaceholderNotFound {
            library: library.to_string(),
            dependent: dependent.name.clone(),
        });
    }

    Ok(dependent.bytecode.replace(&placeholder, &addr))
}

/// Names of libraries whose placeholders remain unresolved in `bytecode`,
/// in order of first occurrence.
pub fn unresolved(bytecode: &str) -> Vec<String> {
    let mut names = Vec::new();
    for m in PLACEHOLDER_RE.find_iter(bytecode) {
        let name = m.as_str()[2..].trim_end_matches('_').to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Strip the `0x` prefix and lowercase; reject anything that is not a
/// 20-byte hex address.
fn normalize_address(address: &str) -> Result<String, LinkError> {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);

    if hex.len() != PLACEHOLDER_WIDTH || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LinkError::InvalidAddress(address.to_string()));
    }

    Ok(hex.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x00000000000000000000000000000000deadbeef";

    fn dependent_with(bytecode: String) -> Artifact {
        Artifact::new("consumer", bytecode)
    }

    #[test]
    fn replaces_every_occurrence() {
        let ph = Artifact::placeholder("mathlib");
        let artifact = dependent_with(format!("0x6080{ph}5050{ph}00"));

        let linked = link_into(&artifact, "mathlib", ADDR).unwrap();
        assert_eq!(
            linked,
            "0x608000000000000000000000000000000000deadbeef505000000000000000000000000000000000deadbeef00"
        );
        assert!(!linked.contains('_'));
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let artifact = dependent_with("0x60806040".to_string());
        let err = link_into(&artifact, "mathlib", ADDR).unwrap_err();
        assert!(matches!(
            err,
            LinkError::PlaceholderNotFound { ref library, ref dependent }
                if library == "mathlib" && dependent == "consumer"
        ));
    }

    #[test]
    fn other_placeholders_are_left_alone() {
        let keep = Artifact::placeholder("other");
        let artifact = dependent_with(format!(
            "0x6080{}60{keep}",
            Artifact::placeholder("mathlib")
        ));

        let linked = link_into(&artifact, "mathlib", ADDR).unwrap();
        assert!(linked.contains(&keep));
        assert_eq!(unresolved(&linked), vec!["other"]);
    }

    #[test]
    fn uppercase_and_prefixed_addresses_normalize() {
        let ph = Artifact::placeholder("lib");
        let artifact = dependent_with(format!("0x{ph}"));

        let linked =
            link_into(&artifact, "lib", "0X00000000000000000000000000000000DEADBEEF").unwrap();
        assert_eq!(linked, "0x00000000000000000000000000000000deadbeef");
    }

    #[test]
    fn rejects_malformed_addresses() {
        let ph = Artifact::placeholder("lib");
        let artifact = dependent_with(format!("0x{ph}"));

        for bad in ["0x1234", "nonsense", "0xzz000000000000000000000000000000deadbeef"] {
            let err = link_into(&artifact, "lib", bad).unwrap_err();
            assert!(matches!(err, LinkError::InvalidAddress(_)), "{bad}");
        }
    }

    #[test]
    fn unresolved_lists_adjacent_placeholders() {
        let bytecode = format!(
            "0x{}{}",
            Artifact::placeholder("first"),
            Artifact::placeholder("second")
        );
        assert_eq!(unresolved(&bytecode), vec!["first", "second"]);
    }

    #[test]
    fn unresolved_dedupes_repeats() {
        let ph = Artifact::placeholder("lib");
        let bytecode = format!("0x{ph}60{ph}");
        assert_eq!(unresolved(&bytecode), vec!["lib"]);
    }

    #[test]
    fn unresolved_empty_for_linked_bytecode() {
        assert!(unresolved("0x6080604052").is_empty());
    }
}
