//! Capture file rows
//!
//! The file is plain ASCII, `;`-separated, one header row followed by one
//! row per sample, every row ending in `\n`:
//!
//! ```text
//! numero_amostra;accel_x;accel_y;accel_z;giro_x;giro_y;giro_z
//! 1;0.01;-0.02;0.99;-12;4;131
//! ```
//!
//! Acceleration is in g with two decimals; angular rate stays in raw counts.

use crate::error::CaptureFileError;
use crate::sensor::RawSample;
use std::fmt;
use std::io::BufRead;

/// Column names, first row of every capture file
///
/// Kept as the board firmware writes them so existing plotting scripts keep
/// reading the files.
pub const HEADER: &str = "numero_amostra;accel_x;accel_y;accel_z;giro_x;giro_y;giro_z\n";

const FIELD_SEPARATOR: char = ';';
const FIELD_COUNT: usize = 7;

/// One row of the capture file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    /// 1-based position within the session
    pub index: u32,
    /// Acceleration X, Y, Z in g
    pub accel_g: [f32; 3],
    /// Angular rate X, Y, Z in raw counts
    pub gyro: [i16; 3],
}

impl SampleRecord {
    pub fn from_raw(index: u32, raw: &RawSample, counts_per_g: f32) -> Self {
        Self {
            index,
            accel_g: raw.accel_to_g(counts_per_g),
            gyro: raw.gyro,
        }
    }

    /// Row text including the trailing newline
    pub fn to_row(&self) -> String {
        format!("{}\n", self)
    }

    /// Parse a row (with or without its newline)
    pub fn parse(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.trim_end().split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                fields.len()
            ));
        }

        let index = fields[0]
            .parse::<u32>()
            .map_err(|e| format!("bad sample index '{}': {}", fields[0], e))?;

        let mut accel_g = [0.0f32; 3];
        for (axis, field) in accel_g.iter_mut().zip(&fields[1..4]) {
            *axis = field
                .parse()
                .map_err(|e| format!("bad acceleration '{}': {}", field, e))?;
        }

        let mut gyro = [0i16; 3];
        for (axis, field) in gyro.iter_mut().zip(&fields[4..7]) {
            *axis = field
                .parse()
                .map_err(|e| format!("bad angular rate '{}': {}", field, e))?;
        }

        Ok(Self {
            index,
            accel_g,
            gyro,
        })
    }
}

impl fmt::Display for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{:.2};{:.2};{:.2};{};{};{}",
            self.index,
            self.accel_g[0],
            self.accel_g[1],
            self.accel_g[2],
            self.gyro[0],
            self.gyro[1],
            self.gyro[2]
        )
    }
}

/// What a capture file contains, structurally
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSummary {
    /// Number of data rows
    pub rows: usize,
    pub first_index: Option<u32>,
    pub last_index: Option<u32>,
    /// First place the index did not follow its predecessor: (line, expected, found)
    pub first_break: Option<(usize, u32, u32)>,
}

impl CaptureSummary {
    /// Indices start at 1 and increase by one per row
    pub fn is_contiguous(&self) -> bool {
        self.first_break.is_none() && self.first_index.map_or(true, |i| i == 1)
    }
}

/// Read a capture file back and check its structure
pub fn read_capture<R: BufRead>(reader: R) -> Result<CaptureSummary, CaptureFileError> {
    let mut lines = reader.lines();

    let header = lines.next().ok_or(CaptureFileError::MissingHeader)??;
    if header != HEADER.trim_end() {
        return Err(CaptureFileError::BadHeader(header));
    }

    let mut summary = CaptureSummary::default();
    for (offset, line) in lines.enumerate() {
        let line = line?;
        let line_number = offset + 2;
        if line.is_empty() {
            continue;
        }

        let record = SampleRecord::parse(&line).map_err(|reason| CaptureFileError::BadRow {
            line: line_number,
            reason,
        })?;

        if let Some(last) = summary.last_index {
            let expected = last.wrapping_add(1);
            if record.index != expected && summary.first_break.is_none() {
                summary.first_break = Some((line_number, expected, record.index));
            }
        }

        if summary.first_index.is_none() {
            summary.first_index = Some(record.index);
        }
        summary.last_index = Some(record.index);
        summary.rows += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_row_format() {
        let raw = RawSample {
            accel: [16384, -8192, 164],
            gyro: [-12, 4, 131],
            temp: 0,
        };
        let record = SampleRecord::from_raw(7, &raw, 16384.0);
        assert_eq!(record.to_row(), "7;1.00;-0.50;0.01;-12;4;131\n");
    }

    #[test]
    fn test_row_extremes() {
        let raw = RawSample {
            accel: [i16::MIN, i16::MAX, 0],
            gyro: [i16::MIN, i16::MAX, 0],
            temp: 0,
        };
        let row = SampleRecord::from_raw(1, &raw, 16384.0).to_row();
        assert_eq!(row, "1;-2.00;2.00;0.00;-32768;32767;0\n");
    }

    #[test]
    fn test_header_has_one_column_per_field() {
        assert_eq!(HEADER.trim_end().split(';').count(), FIELD_COUNT);
        assert!(HEADER.ends_with('\n'));
    }

    #[test]
    fn test_header_column_names() {
        let columns: Vec<&str> = HEADER.trim_end().split(';').collect();
        assert_eq!(columns[0], "numero_amostra");
        assert_eq!(&columns[4..], ["giro_x", "giro_y", "giro_z"]);
    }

    #[test]
    fn test_read_capture_rejects_english_header() {
        let text = "sample;accel_x;accel_y;accel_z;gyro_x;gyro_y;gyro_z\n1;0.00;0.00;1.00;0;0;0\n";
        assert!(matches!(
            read_capture(Cursor::new(text)),
            Err(CaptureFileError::BadHeader(_))
        ));
    }

    #[test]
    fn test_parse_rejects_short_rows() {
        assert!(SampleRecord::parse("1;0.00;0.00").is_err());
        assert!(SampleRecord::parse("x;0.00;0.00;0.00;1;2;3").is_err());
        let record = SampleRecord::parse("3;0.25;0.00;-1.00;1;2;3\n").unwrap();
        assert_eq!(record.index, 3);
        assert_eq!(record.gyro, [1, 2, 3]);
    }

    #[test]
    fn test_read_capture_summary() {
        let text = format!("{}1;0.00;0.00;1.00;0;0;0\n2;0.00;0.00;1.00;0;0;0\n", HEADER);
        let summary = read_capture(Cursor::new(text)).unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.first_index, Some(1));
        assert_eq!(summary.last_index, Some(2));
        assert!(summary.is_contiguous());
    }

    #[test]
    fn test_read_capture_reports_gap() {
        let text = format!("{}1;0.00;0.00;1.00;0;0;0\n3;0.00;0.00;1.00;0;0;0\n", HEADER);
        let summary = read_capture(Cursor::new(text)).unwrap();
        assert_eq!(summary.first_break, Some((3, 2, 3)));
        assert!(!summary.is_contiguous());
    }

    #[test]
    fn test_read_capture_header_errors() {
        assert!(matches!(
            read_capture(Cursor::new("")),
            Err(CaptureFileError::MissingHeader)
        ));
        assert!(matches!(
            read_capture(Cursor::new("a,b,c\n")),
            Err(CaptureFileError::BadHeader(_))
        ));
    }

    #[test]
    fn test_header_only_file_is_valid() {
        let summary = read_capture(Cursor::new(HEADER)).unwrap();
        assert_eq!(summary.rows, 0);
        assert!(summary.is_contiguous());
    }
}
