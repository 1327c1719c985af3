//! Printed-page-number validation.
//!
//! Detected page numbers are valuable when trustworthy and actively
//! misleading otherwise. The thresholds here (60% coverage, 0.7
//! confidence, 20% sequence violations) prefer discarding real numbers
//! over adopting wrong ones: the fallback is always the safe sequential
//! 1..N labeling.

use std::collections::BTreeMap;

use crate::models::ParsedPage;

const MIN_CONFIDENCE: f64 = 0.7;
const MIN_COVERAGE_RATIO: f64 = 0.6;
/// Consecutive confident pages may differ by 1..=4 (up to 3 unnumbered
/// pages in between).
const MAX_GAP: i64 = 4;
const MAX_VIOLATION_RATIO: f64 = 0.2;

/// Decide the display label for every page.
///
/// Returns one label per input page: the detected printed numbers when
/// they pass validation (with integer interpolation for gaps between
/// anchors), else sequential "1".."N".
pub fn validate_page_numbers(pages: &[ParsedPage]) -> Vec<String> {
    if use_source_numbers(pages) {
        extract_source_numbers(pages)
    } else {
        sequential(pages.len())
    }
}

fn sequential(n: usize) -> Vec<String> {
    (1..=n).map(|i| i.to_string()).collect()
}

fn confident(page: &ParsedPage) -> bool {
    page.page_number_info.confidence >= MIN_CONFIDENCE
        && !page.page_number_info.page_number.is_empty()
}

fn parse_label(label: &str) -> Option<i64> {
    // Leading integer, as Sscanf-style parsing would accept ("12" but
    // also "12 " and "12-A"); must be positive.
    let digits: String = label
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let value = digits.parse::<i64>().ok()?;
    (value > 0).then_some(value)
}

/// Should the detected numbers be adopted at all?
fn use_source_numbers(pages: &[ParsedPage]) -> bool {
    if pages.is_empty() {
        return false;
    }

    let confident_count = pages.iter().filter(|p| confident(p)).count();
    let coverage = confident_count as f64 / pages.len() as f64;
    if coverage < MIN_COVERAGE_RATIO {
        return false;
    }

    // index -> parsed numeric label, for confident pages only.
    let parsed: BTreeMap<usize, i64> = pages
        .iter()
        .enumerate()
        .filter(|(_, p)| confident(p))
        .filter_map(|(i, p)| parse_label(&p.page_number_info.page_number).map(|n| (i, n)))
        .collect();

    if parsed.len() < 2 {
        return false;
    }
    is_roughly_monotonic(&parsed)
}

/// Page numbers must generally increase with document order; small gaps
/// are fine, larger jumps (or regressions) count as violations, and more
/// than 20% violations rejects the sequence.
fn is_roughly_monotonic(parsed: &BTreeMap<usize, i64>) -> bool {
    let values: Vec<i64> = parsed.values().copied().collect();
    let mut violations = 0usize;
    for pair in values.windows(2) {
        let gap = pair[1] - pair[0];
        if !(1..=MAX_GAP).contains(&gap) {
            violations += 1;
        }
    }
    let ratio = violations as f64 / (values.len() - 1) as f64;
    ratio <= MAX_VIOLATION_RATIO
}

/// Build the final label list from validated detections.
fn extract_source_numbers(pages: &[ParsedPage]) -> Vec<String> {
    let mut labels = vec![String::new(); pages.len()];
    let mut anchored = vec![false; pages.len()];

    // First pass: adopt confident detections verbatim.
    for (i, page) in pages.iter().enumerate() {
        if confident(page) {
            labels[i] = page.page_number_info.page_number.clone();
            anchored[i] = true;
        }
    }

    // Second pass: interpolate integer labels between anchors whose index
    // distance equals the label distance. A leading or trailing run with
    // only one side anchored is left alone.
    for i in 0..labels.len() {
        if anchored[i] {
            continue;
        }
        let prev = (0..i).rev().find(|&j| anchored[j]);
        let next = (i + 1..labels.len()).find(|&j| anchored[j]);
        let (Some(prev), Some(next)) = (prev, next) else {
            continue;
        };
        let (Some(prev_num), Some(next_num)) = (parse_label(&labels[prev]), parse_label(&labels[next]))
        else {
            continue;
        };
        if (next - prev) as i64 == next_num - prev_num {
            labels[i] = (prev_num + (i - prev) as i64).to_string();
            anchored[i] = true;
        }
    }

    // Final pass: anything still unlabeled falls back to its sequential
    // position.
    for (i, label) in labels.iter_mut().enumerate() {
        if label.is_empty() {
            *label = (i + 1).to_string();
        }
    }
    labels
}
