//! Error handling tests for the ansipage crate

use ansipage::{
    AnsiDecoder, AnsiEncoder, Page, PageError, PageSnapshot, UpdateList, UpdateType,
};
use std::io::{self, Write};

struct FailingSink;

impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_page_zero_dimensions() {
    assert!(matches!(Page::new(0, 0), Err(PageError::InvalidDimensions(_))));
    assert!(matches!(Page::new(0, 10), Err(PageError::InvalidDimensions(_))));
    assert!(matches!(Page::new(10, 0), Err(PageError::InvalidDimensions(_))));
}

#[test]
fn test_page_rejects_dimensions_without_room_for_range_ends() {
    assert!(matches!(
        Page::new(1, u16::MAX),
        Err(PageError::InvalidDimensions(_))
    ));
    assert!(matches!(
        Page::new(u16::MAX, 1),
        Err(PageError::InvalidDimensions(_))
    ));
}

#[test]
fn test_widest_page_round_trips() {
    let mut page = Page::new(1, Page::MAX_DIMENSION).unwrap();
    let mut updates = UpdateList::new();
    AnsiDecoder::new()
        .decode(&mut page, b"\x1b[1;65533Hx\ty", &mut updates)
        .unwrap();
    assert_eq!(page.cell(1, 65533).map(|c| c.ch), Some(b'x'));
    assert_eq!(page.cell(1, Page::MAX_DIMENSION).map(|c| c.ch), Some(b'y'));

    let whole = UpdateList::whole_page(&page).unwrap();
    assert_eq!(whole.as_slice(), &[UpdateType::new(1, 1, u16::MAX)]);

    let mut out = Vec::new();
    AnsiEncoder::default()
        .encode(&mut page, &whole, &mut out)
        .unwrap();
    assert!(out.windows(11).any(|w| w == b"\x1b[1;65533H"));
}

#[test]
fn test_page_out_of_bounds_access() {
    let page = Page::new(24, 80).unwrap();

    assert!(page.cell(25, 1).is_none());
    assert!(page.cell(1, 81).is_none());
    assert!(page.cell(u16::MAX, u16::MAX).is_none());
    assert!(page.row_cells(0).is_none());
}

#[test]
fn test_encoder_rejects_second_bad_range() {
    let mut page = Page::new(24, 80).unwrap();
    let mut updates = UpdateList::new();
    updates.push(UpdateType::new(1, 1, 81)).unwrap();
    updates.push(UpdateType::new(2, 40, 82)).unwrap();

    let mut out = Vec::new();
    let err = AnsiEncoder::default()
        .encode(&mut page, &updates, &mut out)
        .unwrap_err();

    assert!(matches!(err, PageError::InvalidUpdate { index: 1, .. }));
    assert!(out.is_empty());
    assert_eq!(page.last_mod, 0);
}

#[test]
fn test_encoder_only_validates_unsent_ranges() {
    let mut page = Page::new(2, 10).unwrap();
    let mut updates = UpdateList::new();
    updates.push(UpdateType::new(9, 1, 2)).unwrap();
    updates.push(UpdateType::new(1, 1, 2)).unwrap();
    page.last_mod = 1;

    let mut out = Vec::new();
    assert!(AnsiEncoder::default()
        .encode(&mut page, &updates, &mut out)
        .is_ok());
}

#[test]
fn test_encoder_sink_failure() {
    let mut page = Page::new(2, 10).unwrap();
    let updates = UpdateList::whole_page(&page).unwrap();

    let err = AnsiEncoder::default()
        .encode_to(&mut page, &updates, &mut FailingSink)
        .unwrap_err();
    assert!(matches!(err, PageError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
}

#[test]
fn test_decoder_malformed_escape_sequences() {
    let mut decoder = AnsiDecoder::new();
    let mut page = Page::new(24, 80).unwrap();
    let mut updates = UpdateList::new();

    let sequences = [
        b"\x1b[".as_ref(),
        b"\x1b[3".as_ref(),
        b"\x1b]0;title\x07".as_ref(),
        b"\x1b(".as_ref(),
        b"\x1b[999999999999999999m".as_ref(),
        b"\x1b[;;;;;m".as_ref(),
        b"\x1b[\x00m".as_ref(),
        b"\x1b[0;0H".as_ref(),
        b"\x1b[99;99H".as_ref(),
        b"\x1b[0r".as_ref(),
        b"\x1b[65535L".as_ref(),
        b"\x1b[65535P".as_ref(),
        b"\x1b[65535@".as_ref(),
        b"\x1b[5J".as_ref(),
    ];

    for seq in &sequences {
        decoder.decode(&mut page, seq, &mut updates).unwrap();
        updates.clear();
    }

    assert!(page.status.row >= 1 && page.status.row <= page.rows());
    assert!(page.status.col >= 1 && page.status.col <= page.cols());
}

#[test]
fn test_decoder_invalid_utf8() {
    let mut decoder = AnsiDecoder::new();
    let mut page = Page::new(2, 10).unwrap();
    let mut updates = UpdateList::new();

    let invalid = [
        vec![0xFF, 0xFE],
        vec![0xC0, 0x80],
        vec![0xED, 0xA0, 0x80],
    ];
    for seq in &invalid {
        decoder.decode(&mut page, seq, &mut updates).unwrap();
    }
    decoder.decode(&mut page, b"ok", &mut updates).unwrap();

    assert!(page.row_text(1).contains("ok"));
}

#[test]
fn test_decoder_incomplete_is_resumable() {
    let mut decoder = AnsiDecoder::new();
    let mut page = Page::new(24, 80).unwrap();
    let mut updates = UpdateList::new();

    // Each write starts a range on a different row
    let input: Vec<u8> = (0..300)
        .flat_map(|i| format!("\x1b[{};{}Hx", i % 24 + 1, i % 80 + 1).into_bytes())
        .collect();

    let mut offset = 0;
    let mut passes = 0;
    loop {
        passes += 1;
        match decoder.decode(&mut page, &input[offset..], &mut updates) {
            Ok(()) => break,
            Err(PageError::DecodeIncomplete { consumed, total }) => {
                assert!(consumed > 0);
                assert_eq!(total, input.len() - offset);
                offset += consumed;
                updates.clear();
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(passes, 2);
    assert_eq!(page.cell(12, 12).map(|c| c.ch), Some(b'x'));
}

#[test]
fn test_snapshot_garbage() {
    assert!(matches!(
        PageSnapshot::from_bytes(b"not a snapshot"),
        Err(PageError::Snapshot(_))
    ));
}

#[test]
fn test_error_messages() {
    let err = PageError::DecodeIncomplete {
        consumed: 10,
        total: 20,
    };
    assert_eq!(
        err.to_string(),
        "Update list filled up after consuming 10 of 20 bytes"
    );

    let err = PageError::UpdateListFull(256);
    assert_eq!(err.to_string(), "Update list is full (256 entries)");
}
