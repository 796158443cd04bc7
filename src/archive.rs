//! Store-only ZIP writer.
//!
//! Layout is `[local entries][central directory][end of central directory]`,
//! built in one pass over an in-memory payload list. Entries are stored
//! uncompressed with the UTF-8 name flag set and zeroed timestamps. ZIP64 is
//! not written: anything that would overflow a classic header field is
//! rejected with [`Error::ArchiveTooLarge`] before a byte is produced.

use crate::checksum::crc32;
use crate::error::{Error, Result, ZipField};
use tracing::debug;

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

const VERSION: u16 = 20;
/// General purpose bit 11: name is UTF-8.
const FLAG_UTF8: u16 = 0x0800;
const METHOD_STORE: u16 = 0;

pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;
pub const END_RECORD_LEN: usize = 22;

/// A named byte payload destined for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub name: String,
    pub data: Vec<u8>,
}

impl Payload {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Header values shared by an entry's local and central records.
struct ZipEntry<'a> {
    name: &'a [u8],
    data: &'a [u8],
    crc: u32,
    size: u32,
    name_len: u16,
    local_offset: u32,
}

fn fit_u16(field: ZipField, value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::archive_too_large(field, value as u64, u16::MAX.into()))
}

fn fit_u32(field: ZipField, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::archive_too_large(field, value as u64, u32::MAX.into()))
}

trait PutLe {
    fn put_u16(&mut self, value: u16);
    fn put_u32(&mut self, value: u32);
}

impl PutLe for Vec<u8> {
    fn put_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_le_bytes());
    }
}

fn layout(payloads: &[Payload]) -> Result<(Vec<ZipEntry<'_>>, usize)> {
    let mut entries = Vec::with_capacity(payloads.len());
    let mut offset = 0usize;

    for payload in payloads {
        let name = payload.name.as_bytes();
        let data = payload.data.as_slice();
        entries.push(ZipEntry {
            name,
            data,
            crc: crc32(data),
            size: fit_u32(ZipField::EntrySize, data.len())?,
            name_len: fit_u16(ZipField::NameLength, name.len())?,
            local_offset: fit_u32(ZipField::LocalHeaderOffset, offset)?,
        });
        offset = offset
            .checked_add(LOCAL_HEADER_LEN + name.len())
            .and_then(|o| o.checked_add(data.len()))
            .ok_or_else(|| {
                Error::archive_too_large(ZipField::CentralDirectoryOffset, u64::MAX, u32::MAX.into())
            })?;
    }

    Ok((entries, offset))
}

/// Serialize `payloads`, in order, into a ZIP archive.
pub fn build(payloads: &[Payload]) -> Result<Vec<u8>> {
    let entry_count = fit_u16(ZipField::EntryCount, payloads.len())?;
    let (entries, local_len) = layout(payloads)?;

    let central_len: usize = entries
        .iter()
        .map(|e| CENTRAL_HEADER_LEN + e.name.len())
        .sum();
    let central_offset = fit_u32(ZipField::CentralDirectoryOffset, local_len)?;
    let central_size = fit_u32(ZipField::CentralDirectorySize, central_len)?;

    let mut out = Vec::with_capacity(local_len + central_len + END_RECORD_LEN);

    for entry in &entries {
        out.put_u32(LOCAL_HEADER_SIGNATURE);
        out.put_u16(VERSION);
        out.put_u16(FLAG_UTF8);
        out.put_u16(METHOD_STORE);
        out.put_u16(0); // mod time
        out.put_u16(0); // mod date
        out.put_u32(entry.crc);
        out.put_u32(entry.size); // compressed
        out.put_u32(entry.size); // uncompressed
        out.put_u16(entry.name_len);
        out.put_u16(0); // extra field length
        out.extend_from_slice(entry.name);
        out.extend_from_slice(entry.data);
    }
    debug_assert_eq!(out.len(), local_len);

    for entry in &entries {
        out.put_u32(CENTRAL_HEADER_SIGNATURE);
        out.put_u16(VERSION); // made by
        out.put_u16(VERSION); // needed
        out.put_u16(FLAG_UTF8);
        out.put_u16(METHOD_STORE);
        out.put_u16(0);
        out.put_u16(0);
        out.put_u32(entry.crc);
        out.put_u32(entry.size);
        out.put_u32(entry.size);
        out.put_u16(entry.name_len);
        out.put_u16(0); // extra field length
        out.put_u16(0); // comment length
        out.put_u16(0); // disk number start
        out.put_u16(0); // internal attributes
        out.put_u32(0); // external attributes
        out.put_u32(entry.local_offset);
        out.extend_from_slice(entry.name);
    }

    out.put_u32(END_OF_CENTRAL_DIRECTORY_SIGNATURE);
    out.put_u16(0); // this disk
    out.put_u16(0); // disk with central directory
    out.put_u16(entry_count);
    out.put_u16(entry_count);
    out.put_u32(central_size);
    out.put_u32(central_offset);
    out.put_u16(0); // comment length

    debug!(
        entries = entry_count,
        local_bytes = local_len,
        central_bytes = central_len,
        total_bytes = out.len(),
        "built zip archive"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn empty_archive_is_just_the_end_record() {
        let zip = build(&[]).unwrap();
        assert_eq!(
            zip,
            vec![0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn single_entry_header_fields() {
        let zip = build(&[Payload::new("a.txt", "123456789")]).unwrap();

        assert_eq!(u32_at(&zip, 0), LOCAL_HEADER_SIGNATURE);
        assert_eq!(u16_at(&zip, 4), 20);
        assert_eq!(u16_at(&zip, 6), 0x0800);
        assert_eq!(u16_at(&zip, 8), 0);
        assert_eq!(u32_at(&zip, 14), 0xCBF4_3926);
        assert_eq!(u32_at(&zip, 18), 9);
        assert_eq!(u32_at(&zip, 22), 9);
        assert_eq!(u16_at(&zip, 26), 5);
        assert_eq!(u16_at(&zip, 28), 0);
        assert_eq!(&zip[30..35], b"a.txt");
        assert_eq!(&zip[35..44], b"123456789");

        let central = 44;
        assert_eq!(u32_at(&zip, central), CENTRAL_HEADER_SIGNATURE);
        assert_eq!(u16_at(&zip, central + 4), 20);
        assert_eq!(u16_at(&zip, central + 6), 20);
        assert_eq!(u16_at(&zip, central + 8), 0x0800);
        assert_eq!(u32_at(&zip, central + 16), 0xCBF4_3926);
        assert_eq!(u32_at(&zip, central + 42), 0);
        assert_eq!(&zip[central + 46..central + 51], b"a.txt");

        let end = central + 51;
        assert_eq!(u32_at(&zip, end), END_OF_CENTRAL_DIRECTORY_SIGNATURE);
        assert_eq!(u16_at(&zip, end + 8), 1);
        assert_eq!(u16_at(&zip, end + 10), 1);
        assert_eq!(u32_at(&zip, end + 12), 51);
        assert_eq!(u32_at(&zip, end + 16), 44);
        assert_eq!(zip.len(), end + END_RECORD_LEN);
    }

    #[test]
    fn central_offsets_point_at_each_local_entry() {
        let payloads = vec![
            Payload::new("first.md", "# hi\n"),
            Payload::new("대화.txt", "hangul name"),
            Payload::new("empty", Vec::new()),
        ];
        let zip = build(&payloads).unwrap();

        let end = zip.len() - END_RECORD_LEN;
        let mut central = u32_at(&zip, end + 16) as usize;
        assert_eq!(u16_at(&zip, end + 10) as usize, payloads.len());

        for payload in &payloads {
            assert_eq!(u32_at(&zip, central), CENTRAL_HEADER_SIGNATURE);
            let name_len = u16_at(&zip, central + 28) as usize;
            let local = u32_at(&zip, central + 42) as usize;

            assert_eq!(u32_at(&zip, local), LOCAL_HEADER_SIGNATURE);
            let data_start = local + LOCAL_HEADER_LEN + name_len;
            assert_eq!(&zip[local + LOCAL_HEADER_LEN..data_start], payload.name.as_bytes());
            assert_eq!(
                &zip[data_start..data_start + payload.data.len()],
                payload.data.as_slice()
            );

            central += CENTRAL_HEADER_LEN + name_len;
        }
        assert_eq!(central, end);
    }

    #[test]
    fn rejects_too_many_entries() {
        let payloads = vec![Payload::new("x", Vec::new()); 65_536];
        match build(&payloads) {
            Err(Error::ArchiveTooLarge { field, actual, .. }) => {
                assert_eq!(field, ZipField::EntryCount);
                assert_eq!(actual, 65_536);
            }
            other => panic!("expected ArchiveTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn rejects_overlong_names() {
        let payloads = vec![Payload::new("n".repeat(70_000), "x")];
        assert!(matches!(
            build(&payloads),
            Err(Error::ArchiveTooLarge {
                field: ZipField::NameLength,
                ..
            })
        ));
    }

    #[test]
    fn accepts_max_entry_count() {
        let payloads = vec![Payload::new("x", Vec::new()); 65_535];
        let zip = build(&payloads).unwrap();
        let end = zip.len() - END_RECORD_LEN;
        assert_eq!(u16_at(&zip, end + 8), 65_535);
    }
}
