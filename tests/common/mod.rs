//! Byte-level builders for audio fixtures.
#![allow(dead_code)]

use music_shelf::audio::picture::PictureBlock;
use std::path::Path;

pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// A silent MPEG frame header, enough to follow an ID3 tag
const MPEG_FRAME: &[u8] = &[0xFF, 0xFB, 0x90, 0x64, 0x00, 0x00, 0x00, 0x00];

pub fn write(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

// ========== MP3 ==========

pub fn mp3_with_picture(mime_type: &str, data: &[u8]) -> Vec<u8> {
    use id3::TagLike;

    let mut tag = id3::Tag::new();
    tag.set_title("Fixture");
    tag.add_frame(id3::frame::Picture {
        mime_type: mime_type.to_string(),
        picture_type: id3::frame::PictureType::CoverFront,
        description: String::new(),
        data: data.to_vec(),
    });

    let mut bytes = Vec::new();
    tag.write_to(&mut bytes, id3::Version::Id3v24).unwrap();
    bytes.extend_from_slice(MPEG_FRAME);
    bytes
}

pub fn mp3_without_picture() -> Vec<u8> {
    use id3::TagLike;

    let mut tag = id3::Tag::new();
    tag.set_title("Plain");
    let mut bytes = Vec::new();
    tag.write_to(&mut bytes, id3::Version::Id3v24).unwrap();
    bytes.extend_from_slice(MPEG_FRAME);
    bytes
}

// ========== FLAC ==========

const FLAC_STREAMINFO: u8 = 0;
const FLAC_VORBIS_COMMENT: u8 = 4;
const FLAC_PICTURE: u8 = 6;

fn streaminfo() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&4096u16.to_be_bytes());
    body.extend_from_slice(&4096u16.to_be_bytes());
    body.extend_from_slice(&[0u8; 6]);
    // sample rate (20 bits), channels - 1 (3), bits per sample - 1 (5), samples (36)
    let packed: u64 = (44_100u64 << 44) | (1u64 << 41) | (15u64 << 36);
    body.extend_from_slice(&packed.to_be_bytes());
    body.extend_from_slice(&[0u8; 16]);
    body
}

fn flac(blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut bytes = b"fLaC".to_vec();
    for (index, (kind, body)) in blocks.iter().enumerate() {
        let last = if index + 1 == blocks.len() { 0x80 } else { 0 };
        bytes.push(kind | last);
        let len = body.len() as u32;
        bytes.extend_from_slice(&len.to_be_bytes()[1..]);
        bytes.extend_from_slice(body);
    }
    bytes
}

pub fn flac_with_picture(block: &PictureBlock) -> Vec<u8> {
    flac(&[
        (FLAC_STREAMINFO, streaminfo()),
        (FLAC_PICTURE, block.to_bytes()),
    ])
}

pub fn flac_with_comments(fields: &[(&str, &str)]) -> Vec<u8> {
    flac(&[
        (FLAC_STREAMINFO, streaminfo()),
        (FLAC_VORBIS_COMMENT, vorbis_comment(fields)),
    ])
}

pub fn flac_without_picture() -> Vec<u8> {
    flac_with_comments(&[("TITLE", "Plain")])
}

// ========== MP4 ==========

pub const MP4_JPEG: u32 = 13;
pub const MP4_PNG: u32 = 14;
pub const MP4_BMP: u32 = 27;

fn atom(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(payload);
    out
}

fn mvhd() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&[0u8; 4]); // version, flags
    payload.extend_from_slice(&[0u8; 8]); // creation, modification
    payload.extend_from_slice(&1000u32.to_be_bytes()); // timescale
    payload.extend_from_slice(&0u32.to_be_bytes()); // duration
    payload.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate
    payload.extend_from_slice(&0x0100u16.to_be_bytes()); // volume
    payload.extend_from_slice(&[0u8; 10]);
    for value in [0x0001_0000u32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
        payload.extend_from_slice(&value.to_be_bytes());
    }
    payload.extend_from_slice(&[0u8; 24]);
    payload.extend_from_slice(&2u32.to_be_bytes()); // next track id
    atom(b"mvhd", &payload)
}

fn mp4(ilst_children: &[u8]) -> Vec<u8> {
    let ftyp = atom(b"ftyp", b"M4A \x00\x00\x02\x00M4A isommp42");

    let mut hdlr = vec![0u8; 8];
    hdlr.extend_from_slice(b"mdirappl");
    hdlr.extend_from_slice(&[0u8; 9]);
    let hdlr = atom(b"hdlr", &hdlr);

    let ilst = atom(b"ilst", ilst_children);
    let mut meta = vec![0u8; 4];
    meta.extend_from_slice(&hdlr);
    meta.extend_from_slice(&ilst);
    let udta = atom(b"udta", &atom(b"meta", &meta));

    let mut moov = mvhd();
    moov.extend_from_slice(&udta);

    let mut bytes = ftyp;
    bytes.extend_from_slice(&atom(b"moov", &moov));
    bytes.extend_from_slice(&atom(b"mdat", &[0u8; 16]));
    bytes
}

pub fn m4a_with_artwork(type_code: u32, data: &[u8]) -> Vec<u8> {
    let mut payload = type_code.to_be_bytes().to_vec();
    payload.extend_from_slice(&[0u8; 4]); // locale
    payload.extend_from_slice(data);
    mp4(&atom(b"covr", &atom(b"data", &payload)))
}

pub fn m4a_without_artwork() -> Vec<u8> {
    let mut payload = 1u32.to_be_bytes().to_vec();
    payload.extend_from_slice(&[0u8; 4]);
    payload.extend_from_slice(b"Plain");
    mp4(&atom(b"\xa9nam", &atom(b"data", &payload)))
}


// ========== Vorbis comments ==========

/// A Vorbis comment list without codec magic or framing bit
pub fn vorbis_comment(fields: &[(&str, &str)]) -> Vec<u8> {
    let vendor = b"fixture";
    let mut out = Vec::new();
    out.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    out.extend_from_slice(vendor);
    out.extend_from_slice(&(fields.len() as u32).to_le_bytes());
    for (key, value) in fields {
        let entry = format!("{}={}", key, value);
        out.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        out.extend_from_slice(entry.as_bytes());
    }
    out
}

// ========== Ogg ==========

const OGG_CONTINUED: u8 = 0x01;
const OGG_FIRST: u8 = 0x02;
const OGG_LAST: u8 = 0x04;

/// Page CRC: polynomial 0x04C11DB7, no reflection, zero initial value
fn ogg_crc(bytes: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &byte in bytes {
        crc ^= u32::from(byte) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ 0x04C1_1DB7
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn ogg_page(serial: u32, sequence: u32, flags: u8, granule: u64, segments: &[&[u8]]) -> Vec<u8> {
    let mut page = b"OggS".to_vec();
    page.push(0);
    page.push(flags);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&serial.to_le_bytes());
    page.extend_from_slice(&sequence.to_le_bytes());
    page.extend_from_slice(&0u32.to_le_bytes());
    page.push(segments.len() as u8);
    for segment in segments {
        page.push(segment.len() as u8);
    }
    for segment in segments {
        page.extend_from_slice(segment);
    }

    let crc = ogg_crc(&page);
    page[22..26].copy_from_slice(&crc.to_le_bytes());
    page
}

/// One logical stream: the identification packet alone on the first page,
/// the remaining headers laced over as many pages as they need, then a
/// final page with a single audio packet.
pub fn ogg_stream(
    serial: u32,
    identification: &[u8],
    headers: &[Vec<u8>],
    audio: &[u8],
    granule: u64,
) -> Vec<u8> {
    let mut bytes = ogg_page(serial, 0, OGG_FIRST, 0, &[identification]);

    let mut segments: Vec<&[u8]> = Vec::new();
    for packet in headers {
        segments.extend(packet.chunks(255));
        if packet.len() % 255 == 0 {
            segments.push(&[]);
        }
    }

    let mut sequence = 1u32;
    let mut continued = false;
    for page in segments.chunks(255) {
        let flags = if continued { OGG_CONTINUED } else { 0 };
        // Pages on which no packet ends carry granule position -1
        let granule = if page.iter().any(|s| s.len() < 255) {
            0
        } else {
            u64::MAX
        };
        bytes.extend(ogg_page(serial, sequence, flags, granule, page));
        sequence += 1;
        continued = page.last().map(|s| s.len() == 255).unwrap_or(false);
    }

    bytes.extend(ogg_page(serial, sequence, OGG_LAST, granule, &[audio]));
    bytes
}

/// Packs values least significant bit first, as Vorbis headers are read
#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    len: usize,
}

impl BitWriter {
    fn put(&mut self, value: u32, bits: u32) -> &mut Self {
        for i in 0..bits {
            if self.len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 1 << (self.len % 8);
            }
            self.len += 1;
        }
        self
    }
}

/// The smallest well-formed Vorbis setup header
fn vorbis_setup() -> Vec<u8> {
    let mut bits = BitWriter::default();
    // one codebook: 1 dimension, 2 entries of length 1, no lookup table
    bits.put(0, 8).put(0x56_4342, 24).put(1, 16).put(2, 24);
    bits.put(0, 1).put(0, 1).put(0, 5).put(0, 5).put(0, 4);
    // one placeholder time domain transform
    bits.put(0, 6).put(0, 16);
    // one type 1 floor with a single partition of class 0
    bits.put(0, 6).put(1, 16).put(1, 5).put(0, 4);
    bits.put(0, 3).put(0, 2).put(0, 8);
    bits.put(0, 2).put(4, 4).put(8, 4);
    // one type 0 residue with a single unused classification
    bits.put(0, 6).put(0, 16).put(0, 24).put(0, 24).put(0, 24);
    bits.put(0, 6).put(0, 8).put(0, 3).put(0, 1);
    // one mapping: a single submap, no coupling
    bits.put(0, 6).put(0, 16).put(0, 1).put(0, 1).put(0, 2);
    bits.put(0, 8).put(0, 8).put(0, 8);
    // one short-block mode, then the framing bit
    bits.put(0, 6).put(0, 1).put(0, 16).put(0, 16).put(0, 8);
    bits.put(1, 1);

    let mut setup = b"\x05vorbis".to_vec();
    setup.extend_from_slice(&bits.bytes);
    setup
}

pub fn ogg_vorbis(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut identification = b"\x01vorbis".to_vec();
    identification.extend_from_slice(&0u32.to_le_bytes());
    identification.push(2);
    identification.extend_from_slice(&44_100u32.to_le_bytes());
    identification.extend_from_slice(&[0u8; 12]);
    // blocksizes 256 and 2048, framing bit
    identification.extend_from_slice(&[0xB8, 0x01]);

    let mut comment = b"\x03vorbis".to_vec();
    comment.extend_from_slice(&vorbis_comment(fields));
    comment.push(0x01);

    ogg_stream(
        0x5EED,
        &identification,
        &[comment, vorbis_setup()],
        &[0x00; 4],
        1024,
    )
}

pub fn ogg_opus(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut head = b"OpusHead".to_vec();
    head.push(1);
    head.push(2);
    head.extend_from_slice(&312u16.to_le_bytes());
    head.extend_from_slice(&48_000u32.to_le_bytes());
    head.extend_from_slice(&0u16.to_le_bytes());
    head.push(0);

    let mut tags = b"OpusTags".to_vec();
    tags.extend_from_slice(&vorbis_comment(fields));

    // A single 10 ms SILK frame
    ogg_stream(0x0905, &head, &[tags], &[0x00, 0x00], 48_000)
}
