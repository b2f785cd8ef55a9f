//! Movement log parsing.
//!
//! The instrumented runtime appends one comma-delimited row per memory
//! movement, interleaved with structural marker rows. There is no explicit
//! end marker: a region runs from its begin marker to the next one (or to end
//! of input), so the parser is an explicit two-state machine rather than an
//! ad hoc accumulator.
//!
//! Rows come in three shapes:
//! - `begin_node,<begin>,...,<end>` opens a new region, closing any open one;
//! - `orig_addr,...` is a column header written by the runtime, skipped;
//! - anything else is a movement event `orig,dest,bytes,flag` attributed to
//!   the currently open region.
//!
//! Instrumentation logs get truncated mid-row routinely, so a malformed row
//! is skipped with a recorded warning instead of failing the run.

use std::fs;

use camino::Utf8Path;

use crate::error::MovementError;
use crate::model::{MovementEvent, TargetRegion};

/// First field of a row opening a new target region.
pub const BEGIN_MARKER: &str = "begin_node";

/// First field of the column-header row written by the runtime.
pub const COLUMN_HEADER: &str = "orig_addr";

/// Fields of a movement event row, in positional order.
const EVENT_FIELDS: usize = 4;

/// Minimum fields of a begin row: the marker, the begin node and the end node.
const BEGIN_FIELDS: usize = 3;

/// Parse result: the ordered regions plus warnings for every row that had to
/// be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovementLog {
    pub regions: Vec<TargetRegion>,
    pub warnings: Vec<String>,
}

/// Classification of a single log row.
enum Row {
    Header,
    Begin { begin: String, end: String },
    Event(MovementEvent),
}

/// Parser state: either between regions or inside one.
enum State {
    NoOpenRegion,
    OpenRegion(TargetRegion),
}

impl State {
    /// Emit the open region, if any, and return to the idle state.
    fn flush(&mut self, out: &mut Vec<TargetRegion>) {
        if let State::OpenRegion(region) = std::mem::replace(self, State::NoOpenRegion) {
            out.push(region);
        }
    }
}

/// Read and parse a movement log from disk.
pub fn load_movement_log(path: &Utf8Path) -> Result<MovementLog, MovementError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_movement_log(&text))
}

/// Parse movement log text into ordered target regions.
///
/// Never fails: an empty input yields an empty region list, malformed rows
/// are skipped and reported through [`MovementLog::warnings`].
pub fn parse_movement_log(text: &str) -> MovementLog {
    let mut log = MovementLog::default();
    let mut state = State::NoOpenRegion;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match classify(line) {
            Ok(Row::Header) => (),
            Ok(Row::Begin { begin, end }) => {
                state.flush(&mut log.regions);
                state = State::OpenRegion(TargetRegion::new(begin, end));
            }
            Ok(Row::Event(event)) => match &mut state {
                State::OpenRegion(region) => region.datamove.push(event),
                State::NoOpenRegion => {
                    log.warn(index, "movement event before any region begin");
                }
            },
            Err(reason) => log.warn(index, &reason),
        }
    }

    // The last region has no next begin marker to close it.
    state.flush(&mut log.regions);

    log
}

impl MovementLog {
    fn warn(&mut self, index: usize, reason: &str) {
        let warning = format!("line {}: {reason}, row skipped", index + 1);
        tracing::warn!("Movement log {warning}");
        self.warnings.push(warning);
    }
}

fn classify(line: &str) -> Result<Row, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    match fields[0] {
        COLUMN_HEADER => Ok(Row::Header),
        BEGIN_MARKER => {
            if fields.len() < BEGIN_FIELDS {
                return Err(format!(
                    "begin marker with {} fields, expected at least {BEGIN_FIELDS}",
                    fields.len()
                ));
            }
            Ok(Row::Begin {
                begin: fields[1].to_string(),
                // Trailing empty fields pad the row; the end node sits last.
                end: fields[fields.len() - 1].to_string(),
            })
        }
        _ => {
            if fields.len() < EVENT_FIELDS {
                return Err(format!(
                    "event with {} fields, expected {EVENT_FIELDS}",
                    fields.len()
                ));
            }
            let bytes = fields[2]
                .parse::<u64>()
                .map_err(|_| format!("byte count '{}' is not an integer", fields[2]))?;
            Ok(Row::Event(MovementEvent {
                orig_address: fields[0].to_string(),
                dest_address: fields[1].to_string(),
                bytes,
                flag: fields[3].to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(orig: &str, dest: &str, bytes: u64, flag: &str) -> MovementEvent {
        MovementEvent {
            orig_address: orig.into(),
            dest_address: dest.into(),
            bytes,
            flag: flag.into(),
        }
    }

    #[test]
    fn empty_log_yields_no_regions() {
        let log = parse_movement_log("");
        assert!(log.regions.is_empty());
        assert!(log.warnings.is_empty());
    }

    #[test]
    fn log_without_begin_markers_yields_no_regions() {
        let log = parse_movement_log("orig_addr,dest_addr,bytes,flag\n");
        assert!(log.regions.is_empty());
    }

    #[test]
    fn regions_are_delimited_by_the_next_begin_marker() {
        let text = "begin_node,n1,,,n2\n\
                    a1,b1,100,X\n\
                    a2,b2,50,Y\n\
                    begin_node,n3,,,n4\n";
        let log = parse_movement_log(text);

        assert_eq!(
            log.regions,
            vec![
                TargetRegion {
                    begin_node: "n1".into(),
                    end_node: "n2".into(),
                    datamove: vec![event("a1", "b1", 100, "X"), event("a2", "b2", 50, "Y")],
                },
                TargetRegion {
                    begin_node: "n3".into(),
                    end_node: "n4".into(),
                    datamove: vec![],
                },
            ]
        );
        assert!(log.warnings.is_empty());
    }

    #[test]
    fn last_region_is_flushed_at_end_of_input() {
        let text = "begin_node,n1,,,n2\n\
                    a1,b1,10,X\n\
                    a2,b2,20,X\n\
                    a3,b3,30,X\n";
        let log = parse_movement_log(text);

        assert_eq!(log.regions.len(), 1);
        assert_eq!(log.regions[0].datamove.len(), 3);
    }

    #[test]
    fn header_rows_never_become_events_or_regions() {
        let text = "begin_node,n1,,,n2\n\
                    orig_addr,dest_addr,bytes,flag\n\
                    a1,b1,100,X\n";
        let log = parse_movement_log(text);

        assert_eq!(log.regions.len(), 1);
        assert_eq!(log.regions[0].datamove, vec![event("a1", "b1", 100, "X")]);
    }

    #[test]
    fn malformed_row_is_skipped_with_a_warning() {
        let intact = "begin_node,n1,,,n2\n\
                      a1,b1,100,X\n\
                      a2,b2,50,Y\n";
        let truncated = "begin_node,n1,,,n2\n\
                         a1,b1,100,X\n\
                         a2,b2,50\n\
                         a2,b2,50,Y\n";

        let reference = {
            let log = parse_movement_log(intact);
            log.regions
        };
        let log = parse_movement_log(truncated);

        assert_eq!(log.regions, reference);
        assert_eq!(log.warnings.len(), 1);
        assert!(log.warnings[0].contains("line 3"));
    }

    #[test]
    fn non_integer_byte_count_is_skipped() {
        let text = "begin_node,n1,,,n2\na1,b1,lots,X\n";
        let log = parse_movement_log(text);

        assert!(log.regions[0].datamove.is_empty());
        assert_eq!(log.warnings.len(), 1);
    }

    #[test]
    fn stray_event_before_any_region_is_skipped() {
        let text = "a1,b1,100,X\nbegin_node,n1,,,n2\n";
        let log = parse_movement_log(text);

        assert_eq!(log.regions.len(), 1);
        assert!(log.regions[0].datamove.is_empty());
        assert_eq!(log.warnings.len(), 1);
    }

    #[test]
    fn insertion_order_is_temporal_order() {
        let text = "begin_node,n1,,,n2\n\
                    a3,b3,3,Z\n\
                    a1,b1,1,X\n\
                    a2,b2,2,Y\n";
        let log = parse_movement_log(text);

        let bytes: Vec<u64> = log.regions[0].datamove.iter().map(|e| e.bytes).collect();
        assert_eq!(bytes, vec![3, 1, 2]);
    }
}
