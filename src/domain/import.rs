//! Bulk import of members from pasted text.

use crate::models::{digits_only, Member};

use super::MemberIdGenerator;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Parse one member per line: `name phone...`.
///
/// The first token is the name. Remaining tokens are joined and reduced to digits to
/// form the phone. Lines whose first token is empty produce nothing. Ids use the line
/// index, so skipped lines leave gaps.
pub fn parse_import(text: &str, ids: &mut MemberIdGenerator) -> Vec<Member> {
    let batch = ids.next_batch();

    text.split('\n')
        .enumerate()
        .filter_map(|(index, line)| {
            let mut parts = line.trim().split(is_separator);
            let name = parts.next().unwrap_or_default();
            if name.is_empty() {
                return None;
            }
            let phone: String = parts.collect();
            Some(Member {
                id: batch.id(index),
                name: name.to_string(),
                phone: digits_only(&phone),
            })
        })
        .collect()
}

/// Existing members followed by the imported ones.
pub fn append_members(existing: &[Member], imported: Vec<Member>) -> Vec<Member> {
    let mut members = existing.to_vec();
    members.extend(imported);
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_phones() {
        let mut ids = MemberIdGenerator::new();
        let members = parse_import("王小明 0912345678\n陳大華 0920-111-222\n", &mut ids);

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "王小明");
        assert_eq!(members[0].phone, "0912345678");
        assert_eq!(members[1].name, "陳大華");
        assert_eq!(members[1].phone, "0920111222");
    }

    #[test]
    fn test_blank_lines_and_leading_commas_are_skipped() {
        let mut ids = MemberIdGenerator::new();
        let text = "\n   \nAlice\n,0912000000\nBob, 0933 111 222\r\n";
        let members = parse_import(text, &mut ids);

        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(members[0].phone, "");
        assert_eq!(members[1].phone, "0933111222");
    }

    #[test]
    fn test_phone_keeps_only_digits() {
        let mut ids = MemberIdGenerator::new();
        let members = parse_import("Carol +886 (912) 345-678 ext.9", &mut ids);
        assert_eq!(members[0].phone, "8869123456789");
        assert!(members[0].phone.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_ids_are_unique_within_and_across_imports() {
        let mut ids = MemberIdGenerator::new();
        let mut all = parse_import("a\nb\nc", &mut ids);
        all.extend(parse_import("a\nb\nc", &mut ids));

        let mut seen: Vec<&str> = all.iter().map(|m| m.id.as_str()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_append_preserves_existing_order() {
        let existing = vec![Member::new("m1", "Zhang", "1"), Member::new("m2", "Li", "2")];
        let mut ids = MemberIdGenerator::new();
        let merged = append_members(&existing, parse_import("Wang 3", &mut ids));

        assert_eq!(merged.len(), 3);
        assert_eq!(&merged[..2], &existing[..]);
        assert_eq!(merged[2].name, "Wang");
    }
}
