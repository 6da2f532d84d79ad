//! Pluggable naming fallback for columns and tables.
//!
//! Pluralization tables live outside this crate; the default maps both
//! fields and entities to snake_case unchanged otherwise.

/// Maps record/field names to database names when a tag does not pin one.
pub trait NamingStrategy: Send + Sync {
    fn column_name(&self, field: &str) -> String;
    fn table_name(&self, entity: &str) -> String;
}

/// The default snake_case strategy.
pub struct SnakeCaseNaming;

impl NamingStrategy for SnakeCaseNaming {
    fn column_name(&self, field: &str) -> String {
        to_snake_case(field)
    }

    fn table_name(&self, entity: &str) -> String {
        to_snake_case(entity)
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        let naming = SnakeCaseNaming;
        assert_eq!(naming.column_name("firstName"), "first_name");
        assert_eq!(naming.column_name("ID2Fa"), "id2_fa");
        assert_eq!(naming.table_name("UserAccount"), "user_account");
        assert_eq!(naming.column_name("email"), "email");
    }
}
