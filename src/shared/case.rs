//! Key case conversion between the server's camelCase and native snake_case.

/// Convert a camelCase key to snake_case.
///
/// An underscore goes before each uppercase letter that follows a lowercase
/// letter or digit. Inside an acronym run the split happens before the last
/// capital, so `HTTPResponse` becomes `http_response`, not `h_t_t_p_response`.
///
/// The acronym rule means adjacent single capitals read as one word:
/// `pointXY` becomes `point_xy`. See [`camelize`] for the reverse limit.
pub fn underscorize(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Convert a snake_case key to camelCase.
///
/// Only a lone underscore followed by a lowercase letter is folded. Runs of
/// two or more underscores are left alone so query suffixes such as
/// `sample_pct__gte` come out as `samplePct__gte`. A leading underscore and an
/// underscore before a digit are kept as well.
///
/// Keys with two or more single-letter segments in a row do not survive a
/// trip back through [`underscorize`]: `point_x_y` camelizes to `pointXY`,
/// which comes back as `point_xy`.
pub fn camelize(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '_' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i] == '_' {
            i += 1;
        }
        let run = i - start;

        match chars.get(i) {
            Some(next) if run == 1 && start > 0 && next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                i += 1;
            }
            _ => out.extend(std::iter::repeat('_').take(run)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscorize_simple() {
        assert_eq!(underscorize("maxDigits"), "max_digits");
        assert_eq!(underscorize("projectId"), "project_id");
        assert_eq!(underscorize("already_snake"), "already_snake");
    }

    #[test]
    fn test_underscorize_acronym_run_splits_before_last_capital() {
        assert_eq!(underscorize("HTTPResponse"), "http_response");
        assert_eq!(underscorize("parseXMLDocument"), "parse_xml_document");
        assert_eq!(underscorize("userID"), "user_id");
    }

    #[test]
    fn test_underscorize_after_digit() {
        assert_eq!(underscorize("r2Score"), "r2_score");
        assert_eq!(underscorize("top10Features"), "top10_features");
    }

    #[test]
    fn test_underscorize_keeps_double_underscore_suffix() {
        assert_eq!(underscorize("samplePct__gte"), "sample_pct__gte");
    }

    #[test]
    fn test_camelize_simple() {
        assert_eq!(camelize("max_digits"), "maxDigits");
        assert_eq!(camelize("number_of_backtests"), "numberOfBacktests");
        assert_eq!(camelize("id"), "id");
    }

    #[test]
    fn test_camelize_preserves_double_underscore() {
        assert_eq!(camelize("sample_pct__gte"), "samplePct__gte");
        assert_eq!(camelize("created__lt"), "created__lt");
    }

    #[test]
    fn test_camelize_leading_and_digit_underscores() {
        assert_eq!(camelize("_private"), "_private");
        assert_eq!(camelize("model_2"), "model_2");
        assert_eq!(camelize("trailing_"), "trailing_");
    }

    #[test]
    fn test_snake_round_trip() {
        for name in [
            "max_digits",
            "datetime_partition_column",
            "validation_start_date",
            "use_time_series",
            "holdout_end_date",
            "id",
        ] {
            assert_eq!(underscorize(&camelize(name)), name, "round trip of {name}");
        }
    }

    #[test]
    fn test_single_letter_segments_do_not_round_trip() {
        assert_eq!(camelize("point_x_y"), "pointXY");
        assert_eq!(underscorize("pointXY"), "point_xy");
        assert_eq!(camelize("point_x_y_z"), "pointXYZ");
        assert_eq!(underscorize("pointXYZ"), "point_xyz");

        // A single one-letter segment is fine.
        assert_eq!(underscorize(&camelize("point_x")), "point_x");
        assert_eq!(underscorize(&camelize("x_axis_label")), "x_axis_label");
    }
}
