//! Field name -> column name mapping.

/// Convert a field identifier to the snake_case column name.
/// e.g. "CreatedAt" -> "created_at", "UserID" -> "user_id", "room_name" -> "room_name"
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                // Last capital of an acronym followed by a lowercase word: "HTTPServer" -> "http_server".
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                Some(_) => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_from_camel() {
        assert_eq!(to_snake_case("CreatedAt"), "created_at");
        assert_eq!(to_snake_case("participantLimits"), "participant_limits");
        assert_eq!(to_snake_case("A"), "a");
    }

    #[test]
    fn snake_case_acronyms() {
        assert_eq!(to_snake_case("ID"), "id");
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
    }

    #[test]
    fn snake_case_is_stable() {
        assert_eq!(to_snake_case("room_name"), "room_name");
        assert_eq!(to_snake_case("ctime"), "ctime");
    }
}
