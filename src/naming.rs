//! Identifier casing
//!
//! Database identifiers are split on spaces and underscores. Every segment is
//! capitalized and the remainder lowercased, so mixed-case input is flattened:
//! `"FirstName"` becomes `"Firstname"`.

const SEPARATORS: [char; 2] = [' ', '_'];

/// Convert a database identifier to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    s.split(SEPARATORS)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    let first_upper = first.to_uppercase().to_string();
                    first_upper + &chars.as_str().to_lowercase()
                }
            }
        })
        .collect()
}

/// Convert a database identifier to camelCase
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().to_string() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case_snake() {
        assert_eq!(to_pascal_case("first_name"), "FirstName");
        assert_eq!(to_pascal_case("order_line_items"), "OrderLineItems");
    }

    #[test]
    fn test_pascal_case_single_word() {
        assert_eq!(to_pascal_case("actor"), "Actor");
        assert_eq!(to_pascal_case("ACTOR"), "Actor");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("first_name"), "firstName");
        assert_eq!(to_camel_case("actor"), "actor");
        assert_eq!(to_camel_case("LAST_UPDATE"), "lastUpdate");
    }

    #[test]
    fn test_space_separator() {
        assert_eq!(to_pascal_case("first name"), "FirstName");
        assert_eq!(to_camel_case("order line item"), "orderLineItem");
    }

    #[test]
    fn test_repeated_and_edge_separators() {
        assert_eq!(to_pascal_case("first__name"), "FirstName");
        assert_eq!(to_pascal_case("_first_name_"), "FirstName");
        assert_eq!(to_pascal_case("first _name"), "FirstName");
    }

    #[test]
    fn test_mixed_case_is_flattened() {
        assert_eq!(to_pascal_case("FirstName"), "Firstname");
        assert_eq!(to_camel_case("firstName"), "firstname");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_pascal_case(""), "");
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_camel_case("__"), "");
    }

    #[test]
    fn test_idempotent_for_single_segment() {
        let once = to_pascal_case("actor");
        assert_eq!(to_pascal_case(&once), once);

        let once = to_camel_case("actor");
        assert_eq!(to_camel_case(&once), once);
    }

    #[test]
    fn test_not_idempotent_for_multi_segment() {
        let once = to_pascal_case("first_name");
        assert_eq!(once, "FirstName");
        assert_eq!(to_pascal_case(&once), "Firstname");

        let once = to_camel_case("first_name");
        assert_eq!(to_camel_case(&once), "firstname");
    }
}
