//! Set-structure grouping for chained rendering.
//!
//! Consecutive exercises sharing a chaining structure form a *run*; a run is
//! subdivided into fixed-size *chunks* (2 for supersets, 3 for trisets) and a
//! connector is drawn between exercises that belong to the same chunk. Chunk
//! boundaries restart inside a long run, so an odd-length run degrades to a
//! trailing unconnected exercise instead of erroring: 5 consecutive
//! supersets render as pairs (0,1) and (2,3) plus a lone 4.

use serde::Serialize;

use crate::types::SetStructure;

/// Chunk size for a chaining structure; `None` means the structure never
/// links neighboring exercises.
fn chunk_size(structure: SetStructure) -> Option<usize> {
    match structure {
        SetStructure::Superset => Some(2),
        SetStructure::Triset => Some(3),
        SetStructure::Normal | SetStructure::DropSet | SetStructure::RestPause => None,
    }
}

/// Connector state between position `i` and `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub show: bool,
    /// Effective structure at position `i`, for styling
    pub structure: SetStructure,
}

impl Connector {
    fn none(structure: SetStructure) -> Self {
        Self {
            show: false,
            structure,
        }
    }
}

/// Compute whether a connector renders after position `i`.
///
/// `structures` is the ordered list of effective structures for the day's
/// exercise list (committed and provisional alike; chaining is a rendering
/// concern, not a persistence one).
pub fn connector_after(structures: &[SetStructure], i: usize) -> Connector {
    let Some(&structure) = structures.get(i) else {
        return Connector::none(SetStructure::Normal);
    };
    let Some(size) = chunk_size(structure) else {
        return Connector::none(structure);
    };

    // Maximal contiguous run of the same structure around i
    let mut run_start = i;
    while run_start > 0 && structures[run_start - 1] == structure {
        run_start -= 1;
    }
    let mut run_end = i;
    while run_end + 1 < structures.len() && structures[run_end + 1] == structure {
        run_end += 1;
    }

    // Last element of its chunk never connects forward, and neither does
    // the run's final element (the trailing-singleton degradation)
    let position = i - run_start;
    let last_of_chunk = position % size == size - 1;

    Connector {
        show: !last_of_chunk && i != run_end,
        structure,
    }
}
