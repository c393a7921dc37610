//! `psr check`: would this booking be accepted next to the ones on file?

use std::io::Write;

use anyhow::{Result, bail};
use chrono::Utc;
use psr_core::{BookingId, BookingRequest, FloorLayout, TableId, validate_booking};

use crate::cli::CheckArgs;
use crate::commands::util::load_bookings;

/// Prints the accepted booking, or fails with the rejection reason.
pub fn run<W: Write>(writer: &mut W, args: &CheckArgs, layout: &FloorLayout) -> Result<()> {
    let existing = load_bookings(&args.bookings)?;
    tracing::debug!(count = existing.len(), "loaded bookings");

    // an edit keeps the stored id and creation time
    let (id, created_at) = match &args.id {
        Some(id) => {
            let id = BookingId::new(id.as_str())?;
            let created_at = existing
                .iter()
                .find(|b| b.id == id)
                .map_or_else(Utc::now, |b| b.created_at);
            (id, created_at)
        }
        None => (BookingId::generate(), Utc::now()),
    };

    let request = BookingRequest {
        table: Some(TableId(args.table)),
        date: Some(args.date),
        start: Some(args.start),
        length: Some(args.hours),
        console: args.console,
        booker_name: Some(args.name.clone()),
        contact_number: Some(args.contact.clone()),
    };

    match validate_booking(
        request,
        id,
        created_at,
        layout,
        &existing,
        args.id.is_some(),
    ) {
        Ok(booking) => {
            writeln!(
                writer,
                "accepted: table {} ({}) on {} {}-{}",
                booking.table,
                booking.console,
                booking.date,
                booking.start.format("%H:%M"),
                booking.end_time().format("%H:%M")
            )?;
            Ok(())
        }
        Err(err) => bail!("rejected: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    use chrono::{NaiveDate, NaiveTime};
    use psr_core::{BookingLength, ConsoleType};

    const BOOKINGS: &str = r#"[
        {
            "id": "andi-0001",
            "table": 5,
            "date": "2025-01-10",
            "start": "10:00",
            "length": 2.0,
            "console": "ps5",
            "booker_name": "Andi Pratama",
            "contact_number": "081234567890",
            "created_at": "2025-01-09T08:00:00Z"
        }
    ]"#;

    fn args(bookings: &Path, table: u32, start: (u32, u32), hours: u32) -> CheckArgs {
        CheckArgs {
            bookings: bookings.to_path_buf(),
            table,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            hours: BookingLength::from_hours(hours).unwrap(),
            console: None,
            id: None,
            name: "walk-in".to_string(),
            contact: "-".to_string(),
        }
    }

    fn check(args: &CheckArgs) -> Result<String> {
        let mut out = Vec::new();
        run(&mut out, args, &FloorLayout::default())?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn bookings_file() -> (tempfile::TempDir, std::path::PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bookings.json");
        std::fs::write(&path, BOOKINGS).unwrap();
        (temp, path)
    }

    #[test]
    fn test_overlap_is_rejected() {
        let (_temp, path) = bookings_file();
        let err = check(&args(&path, 5, (11, 0), 1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "rejected: table 5 is already booked from 10:00 for 2h on 2025-01-10"
        );
    }

    #[test]
    fn test_adjacent_booking_is_accepted() {
        let (_temp, path) = bookings_file();
        let out = check(&args(&path, 5, (12, 0), 1)).unwrap();
        assert_eq!(out, "accepted: table 5 (PS5) on 2025-01-10 12:00-13:00\n");
    }

    #[test]
    fn test_editing_own_booking_is_not_a_conflict() {
        let (_temp, path) = bookings_file();
        let mut edit = args(&path, 5, (10, 0), 2);
        edit.id = Some("andi-0001".to_string());
        assert!(check(&edit).is_ok());

        edit.id = None;
        assert!(check(&edit).is_err());
    }

    #[test]
    fn test_table_outside_console_range() {
        let (_temp, path) = bookings_file();
        let mut wrong = args(&path, 2, (10, 0), 1);
        wrong.console = Some(ConsoleType::Ps5);
        let err = check(&wrong).unwrap_err();
        assert_eq!(
            err.to_string(),
            "rejected: invalid booking: table: table 2 is not a PS5 table (use 5-8)"
        );
    }

    #[test]
    fn test_missing_bookings_file() {
        let temp = tempfile::tempdir().unwrap();
        let err = check(&args(&temp.path().join("nope.json"), 1, (9, 0), 1)).unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}
