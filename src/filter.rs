use crate::parser::PatientTags;

/// Days-per-year divisor used for `D`-suffixed age codes.
///
/// This is intentionally 356, not 365. The archives this scanner runs
/// against were classified with the 356 divisor, and changing it would move
/// files near year boundaries into different age buckets.
const DAYS_PER_YEAR: f64 = 356.0;

/// The patient criteria a file must satisfy exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatientFilter {
    /// Age in years, after unit conversion.
    pub age_years: f64,

    /// Sex code compared against the first character of the `PatientSex`
    /// tag. Usually one of `'M'`, `'F'`, `'O'`.
    pub sex: char,
}

impl PatientFilter {
    /// Build a filter from an age in years and a sex code.
    ///
    /// The sex code is not validated; whatever character is given here is
    /// what files are compared against.
    pub fn new(age_years: f64, sex: char) -> Self {
        Self { age_years, sex }
    }

    /// Whether extracted tags satisfy this filter. Both fields must match.
    ///
    /// Ages compare with exact equality on the converted value; there is no
    /// tolerance. Sex matches on the first character of the raw tag value.
    /// Tags whose age code does not convert never match.
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, tags: &PatientTags) -> bool {
        let age = match parse_age_code(&tags.age) {
            Some(age) => age,
            None => return false,
        };
        let sex = match tags.sex.chars().next() {
            Some(sex) => sex,
            None => return false,
        };
        age == self.age_years && sex == self.sex
    }
}

/// Convert a 4-character age code (`"035Y"`) into years.
///
/// The code is a 3-digit zero-padded count followed by a unit: `Y`ears,
/// `M`onths, `W`eeks or `D`ays. A malformed code or an unknown unit yields
/// `None`, which callers treat as match-never.
pub(crate) fn parse_age_code(code: &str) -> Option<f64> {
    if code.len() != 4 || !code.is_ascii() {
        return None;
    }
    let (digits, unit) = code.split_at(3);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let count = f64::from(digits.parse::<u32>().ok()?);
    match unit {
        "Y" => Some(count),
        "M" => Some(count / 12.0),
        "W" => Some(count / 52.0),
        "D" => Some(count / DAYS_PER_YEAR),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years_pass_through() {
        assert_eq!(parse_age_code("035Y"), Some(35.0));
        assert_eq!(parse_age_code("000Y"), Some(0.0));
        assert_eq!(parse_age_code("999Y"), Some(999.0));
    }

    #[test]
    fn months_weeks_days_divide() {
        assert_eq!(parse_age_code("024M"), Some(2.0));
        assert_eq!(parse_age_code("010W"), Some(10.0 / 52.0));
        assert_eq!(parse_age_code("100D"), Some(100.0 / 356.0));
    }

    #[test]
    fn malformed_codes_yield_nothing() {
        assert_eq!(parse_age_code(""), None);
        assert_eq!(parse_age_code("35Y"), None);
        assert_eq!(parse_age_code("0035Y"), None);
        assert_eq!(parse_age_code("035y"), None);
        assert_eq!(parse_age_code("035Q"), None);
        assert_eq!(parse_age_code("03aY"), None);
        assert_eq!(parse_age_code("+35Y"), None);
        assert_eq!(parse_age_code("é5Y"), None);
    }

    #[test]
    fn matching_requires_both_fields() {
        let filter = PatientFilter::new(35.0, 'M');
        let tags = |age: &str, sex: &str| PatientTags {
            age: age.into(),
            sex: sex.into(),
        };

        assert!(filter.matches(&tags("035Y", "M")));
        // The first character of the sex value decides.
        assert!(filter.matches(&tags("035Y", "MR")));

        assert!(!filter.matches(&tags("035Y", "F")));
        assert!(!filter.matches(&tags("034Y", "M")));
        assert!(!filter.matches(&tags("035Q", "M")));
        assert!(!filter.matches(&tags("035Y", "")));
    }

    #[test]
    fn unit_conversions_agree_with_year_filters() {
        let two_years = PatientFilter::new(2.0, 'F');
        let tags = PatientTags {
            age: "024M".into(),
            sex: "F".into(),
        };
        assert!(two_years.matches(&tags));
    }
}
