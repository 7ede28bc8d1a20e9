//! Compound name transform
//!
//! Security groups are scoped to a VPC in the real world, but most backends
//! only offer a flat namespace. The externally visible name is synthesized
//! as `{vpc_name}{SG_DELIMITER}{local_name}`. Subnets ride inside their VPC
//! under a reserved `subnet:` prefix. Both tokens are rejected in raw
//! user-supplied names before any backend call, so no partial state can
//! exist for a name that would later fail to decode.

use crate::error::{CoreError, Result};

/// Reserved prefix for subnet entries inside a VPC's namespace.
pub const SUBNET_PREFIX: &str = "subnet:";

/// Delimiter joining an owner VPC name and a security group's local name.
pub const SG_DELIMITER: &str = "-delimiter-";

/// Builds the flat compound name for an owner-scoped resource.
pub fn encode(owner: &str, local: &str) -> String {
    format!("{owner}{SG_DELIMITER}{local}")
}

/// Splits a flat compound name back into `(owner, local)`.
///
/// Total: splits at the first delimiter occurrence; a delimiter-free input
/// decodes as `("", input)`. For any delimiter-free `owner` and `local`,
/// `decode(&encode(owner, local)) == (owner, local)`.
pub fn decode(flat: &str) -> (&str, &str) {
    match flat.split_once(SG_DELIMITER) {
        Some((owner, local)) => (owner, local),
        None => ("", flat),
    }
}

/// Validates a raw user-supplied VPC name.
///
/// Rejects the subnet reservation prefix and the scoping delimiter, both of
/// which would make later decoding ambiguous.
pub fn validate_vpc_name(name: &str) -> Result<()> {
    if name.starts_with(SUBNET_PREFIX) {
        return Err(CoreError::Validation(format!(
            "'{SUBNET_PREFIX}' cannot be used as a VPC name prefix"
        )));
    }
    if name.starts_with(SG_DELIMITER) {
        return Err(CoreError::Validation(format!(
            "'{SG_DELIMITER}' cannot be used in a VPC name"
        )));
    }
    Ok(())
}

/// Validates a raw user-supplied security group local name.
pub fn validate_sg_name(name: &str) -> Result<()> {
    if name.starts_with(SG_DELIMITER) {
        return Err(CoreError::Validation(format!(
            "'{SG_DELIMITER}' cannot be used in a security group name"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_is_left_inverse_of_encode() {
        for (owner, local) in [("prod-vpc", "web"), ("a", "b"), ("vpc_1", "allow-ssh")] {
            let flat = encode(owner, local);
            assert_eq!(decode(&flat), (owner, local));
        }
    }

    #[test]
    fn decode_is_total_on_plain_names() {
        assert_eq!(decode("no-delimiter-free"), ("no", "free"));
        assert_eq!(decode("plain"), ("", "plain"));
    }

    #[test]
    fn decode_splits_at_first_delimiter() {
        let flat = encode("vpc", &encode("inner", "sg"));
        assert_eq!(decode(&flat), ("vpc", "inner-delimiter-sg"));
    }

    #[test]
    fn vpc_name_rejects_reserved_tokens() {
        assert!(validate_vpc_name("subnet:prod").is_err());
        assert!(validate_vpc_name("-delimiter-x").is_err());
        assert!(validate_vpc_name("prod").is_ok());
        // Reserved tokens are only rejected as prefixes.
        assert!(validate_vpc_name("my-subnet:ish").is_ok());
    }

    #[test]
    fn sg_name_rejects_delimiter_prefix() {
        assert!(validate_sg_name("-delimiter-web").is_err());
        assert!(validate_sg_name("web").is_ok());
        assert!(validate_sg_name("subnet:odd").is_ok());
    }
}
