//! Reducing detected candidates to one box per field.

use tracing::debug;

use crate::error::LocateError;
use crate::models::case::{BoundingBox, FieldKind};
use crate::models::config::VerticalWindow;

/// Positional rule applied when a single-box field has several candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    /// Largest left coordinate.
    Rightmost,
    /// Smallest left coordinate.
    Leftmost,
}

/// Rule used for a single-box field. The street box sits right of the
/// reason box, the city box left of the state box.
pub fn rule_for(field: FieldKind) -> SelectionRule {
    match field {
        FieldKind::StreetAddress => SelectionRule::Rightmost,
        FieldKind::City | FieldKind::State | FieldKind::Zip => SelectionRule::Leftmost,
    }
}

/// Pick one box. Ties keep the earliest candidate.
pub fn select(
    field: FieldKind,
    candidates: &[BoundingBox],
    rule: SelectionRule,
) -> Result<BoundingBox, LocateError> {
    let mut iter = candidates.iter();
    let first = *iter.next().ok_or(LocateError::AmbiguousField {
        field,
        candidates: 0,
    })?;

    let chosen = iter.fold(first, |best, candidate| match rule {
        SelectionRule::Rightmost if candidate.left > best.left => *candidate,
        SelectionRule::Leftmost if candidate.left < best.left => *candidate,
        _ => best,
    });

    if candidates.len() > 1 {
        debug!(
            "Chose {:?} for {} out of {} candidates",
            chosen,
            field,
            candidates.len()
        );
    }
    Ok(chosen)
}

/// The state and zip boxes, which share a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateZipBoxes {
    pub state: BoundingBox,
    pub zip: BoundingBox,
}

/// Split state and zip candidates.
///
/// More than two candidates are first narrowed to the vertical window; exactly
/// two must remain. The left one is the state.
pub fn select_state_zip(
    candidates: &[BoundingBox],
    window: VerticalWindow,
) -> Result<StateZipBoxes, LocateError> {
    let narrowed: Vec<BoundingBox> = if candidates.len() > 2 {
        candidates.iter().copied().filter(|b| window.admits(b)).collect()
    } else {
        candidates.to_vec()
    };

    match narrowed.as_slice() {
        [a, b] => {
            let (state, zip) = if a.left < b.left { (*a, *b) } else { (*b, *a) };
            Ok(StateZipBoxes { state, zip })
        }
        other => Err(LocateError::AmbiguousField {
            field: FieldKind::State,
            candidates: other.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(left: u32, top: u32) -> BoundingBox {
        BoundingBox::new(left, top, 200, 120)
    }

    #[test]
    fn test_single_candidate_is_returned() {
        let only = at(40, 40);
        assert_eq!(
            select(FieldKind::City, &[only], SelectionRule::Leftmost).unwrap(),
            only
        );
    }

    #[test]
    fn test_street_prefers_rightmost_and_city_leftmost() {
        let candidates = [at(300, 0), at(900, 0), at(100, 0)];

        let street = select(
            FieldKind::StreetAddress,
            &candidates,
            rule_for(FieldKind::StreetAddress),
        )
        .unwrap();
        assert_eq!(street.left, 900);

        let city = select(FieldKind::City, &candidates, rule_for(FieldKind::City)).unwrap();
        assert_eq!(city.left, 100);
    }

    #[test]
    fn test_no_candidates_is_ambiguous() {
        let err = select(FieldKind::City, &[], SelectionRule::Leftmost).unwrap_err();
        assert!(matches!(
            err,
            LocateError::AmbiguousField {
                field: FieldKind::City,
                candidates: 0
            }
        ));
    }

    #[test]
    fn test_state_zip_ordered_by_left() {
        let window = VerticalWindow {
            min_top: 650,
            max_bottom: 1700,
        };
        let boxes = select_state_zip(&[at(900, 700), at(500, 700)], window).unwrap();
        assert_eq!(boxes.state.left, 500);
        assert_eq!(boxes.zip.left, 900);
    }

    #[test]
    fn test_state_zip_window_narrows_extra_candidates() {
        let window = VerticalWindow {
            min_top: 650,
            max_bottom: 1700,
        };
        let candidates = [at(500, 700), at(100, 100), at(900, 700)];

        let boxes = select_state_zip(&candidates, window).unwrap();
        assert_eq!(boxes.state, at(500, 700));
        assert_eq!(boxes.zip, at(900, 700));
    }

    #[test]
    fn test_state_zip_fails_when_window_leaves_wrong_count() {
        let window = VerticalWindow {
            min_top: 650,
            max_bottom: 1700,
        };
        let candidates = [at(500, 700), at(100, 100), at(900, 100)];

        let err = select_state_zip(&candidates, window).unwrap_err();
        assert!(matches!(
            err,
            LocateError::AmbiguousField {
                field: FieldKind::State,
                candidates: 1
            }
        ));
    }
}
