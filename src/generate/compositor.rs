//! Writes resolved values back into a cell's original text

use crate::parser::Span;
use crate::report::CellValue;

/// Build the output value for one cell.
///
/// `resolved` pairs each marker's span in `original` with its value, in
/// source order. All spans are substituted in a single left-to-right pass, so
/// a value that happens to look like a marker is never re-matched. A cell
/// whose only content is one marker gets that marker's value as-is, keeping
/// its type.
pub fn compose_cell(original: &str, resolved: &[(Span, CellValue)]) -> CellValue {
    if let [(span, value)] = resolved {
        let outside = original.get(..span.start).unwrap_or("").trim().is_empty()
            && original.get(span.end..).unwrap_or("").trim().is_empty();
        if outside {
            return value.clone();
        }
    }

    let mut out = String::with_capacity(original.len());
    let mut cursor = 0;
    for (span, value) in resolved {
        if span.start < cursor || span.end > original.len() {
            continue;
        }
        out.push_str(&original[cursor..span.start]);
        out.push_str(&value.to_string());
        cursor = span.end;
    }
    out.push_str(&original[cursor..]);
    CellValue::Text(out)
}
