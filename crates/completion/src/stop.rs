//! Stop-sequence post-processing.

/// Cut `text` at the earliest occurrence of any stop sequence.
///
/// Empty stop strings are ignored. Text without any hit is returned whole.
pub fn truncate_at_stop<'a>(text: &'a str, stops: &[String]) -> &'a str {
    let cut = stops
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min();

    match cut {
        Some(idx) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_stops_keeps_text() {
        assert_eq!(truncate_at_stop("abc", &[]), "abc");
    }

    #[test]
    fn cuts_at_earliest_hit_regardless_of_list_order() {
        let text = "alpha END beta STOP gamma";
        assert_eq!(truncate_at_stop(text, &stops(&["STOP", "END"])), "alpha ");
    }

    #[test]
    fn missing_stop_keeps_text() {
        assert_eq!(truncate_at_stop("alpha", &stops(&["omega"])), "alpha");
    }

    #[test]
    fn empty_stop_is_ignored() {
        assert_eq!(truncate_at_stop("alpha", &stops(&["", "ph"])), "al");
    }

    #[test]
    fn multibyte_boundaries_are_respected() {
        assert_eq!(truncate_at_stop("测试用例：结束", &stops(&["："])), "测试用例");
    }
}
