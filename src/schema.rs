// Column detection: maps canonical fields to source column names.
//
// Detection is a pure function of the first row's key set, so it is
// stable across every row in the same batch and costs O(columns).
use crate::types::{RawRecord, Schema};
use log::debug;

/// How a rule recognizes a candidate column name.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Case-insensitive whole-key match against any alias.
    Exact(&'static [&'static str]),
    /// Case-insensitive substring match against any needle.
    Contains(&'static [&'static str]),
    /// Case-insensitive whole-key match after removing all spaces,
    /// for headers like "Number of people" / "Number Of People".
    Spaced(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Year,
    Month,
    Date,
    Section,
    Amount,
    Count,
    Average,
}

struct Rule {
    field: Field,
    matcher: Matcher,
    fallback: Option<&'static str>,
}

// One entry per canonical field, in detection order. Alias lists carry
// the Thai header variants the source datasets use. Exact aliases are
// preferred over substring needles by construction: each field uses one
// matcher kind, and keys are scanned in column order so the first
// matching key wins.
const RULES: &[Rule] = &[
    Rule {
        field: Field::Year,
        matcher: Matcher::Exact(&["year"]),
        fallback: None,
    },
    Rule {
        field: Field::Month,
        matcher: Matcher::Exact(&["month"]),
        fallback: None,
    },
    Rule {
        field: Field::Date,
        matcher: Matcher::Contains(&["date", "เดือน", "วันที่"]),
        fallback: None,
    },
    Rule {
        field: Field::Section,
        matcher: Matcher::Exact(&["section", "หมวด", "แผนก", "ประเภท"]),
        fallback: Some("Section"),
    },
    Rule {
        field: Field::Amount,
        matcher: Matcher::Exact(&["amount", "ยอด", "ค่าใช้จ่าย", "total", "sum"]),
        fallback: Some("Amount"),
    },
    Rule {
        field: Field::Count,
        matcher: Matcher::Spaced(&["number", "numberof", "numberofpeople"]),
        fallback: None,
    },
    Rule {
        field: Field::Average,
        matcher: Matcher::Contains(&["avg", "average"]),
        fallback: None,
    },
];

fn key_matches(matcher: Matcher, key: &str) -> bool {
    let lower = key.to_lowercase();
    match matcher {
        Matcher::Exact(aliases) => aliases.iter().any(|a| lower == *a),
        Matcher::Contains(needles) => needles.iter().any(|n| lower.contains(n)),
        Matcher::Spaced(forms) => {
            let squeezed: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
            forms.iter().any(|f| squeezed == *f)
        }
    }
}

fn pick<'a>(keys: &'a [&'a str], rule: &Rule) -> Option<String> {
    keys.iter()
        .find(|k| key_matches(rule.matcher, k))
        .map(|k| (*k).to_string())
        .or_else(|| rule.fallback.map(str::to_string))
}

/// Inspect the key set of the first row and resolve the source column
/// for every canonical field. Empty input yields a schema with only the
/// literal fallbacks filled in.
pub fn detect_schema(rows: &[RawRecord]) -> Schema {
    let keys: Vec<&str> = rows
        .first()
        .map(|r| r.keys().map(String::as_str).collect())
        .unwrap_or_default();

    let mut schema = Schema::default();
    for rule in RULES {
        let chosen = pick(&keys, rule);
        match rule.field {
            Field::Year => schema.year = chosen,
            Field::Month => schema.month = chosen,
            Field::Date => schema.date = chosen,
            Field::Section => schema.section = chosen,
            Field::Amount => schema.amount = chosen,
            Field::Count => schema.count = chosen,
            Field::Average => schema.average = chosen,
        }
    }
    debug!(
        "detected schema from {} column(s): {:?}",
        keys.len(),
        schema
    );
    schema
}
