//! `MessageStore` (C13, spec.md §3.8, §4.10): reads and writes the
//! framed binary file format that pairs a captured incoming
//! `HttpMessage` with its response, grounded field-for-field in
//! `examples/original_source/BaseLibrary/StoreMessage.cpp`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use time::{Month, OffsetDateTime, Weekday};
use wsfab_cookie::Cookie;
use wsfab_http::{HttpMessage, Verb};

use crate::error::StoreError;
use crate::field::{FieldTag, END_MARKER, HTTP_FILE_VERSION, STORE_HTTP_RESPONSE_OFFSET};

/// A single-owner handle on one storage file (spec.md §5: "a
/// MessageStore instance" is single-thread, single-owner).
#[derive(Debug, Clone)]
pub struct MessageStore {
    filename: PathBuf,
}

impl MessageStore {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self { filename: filename.into() }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Truncates the file and writes `msg` as the incoming half of the
    /// pair, leaving the response-offset field pointing just past the
    /// end marker so `store_response_message` knows where to append.
    #[tracing::instrument(skip(self, msg))]
    pub fn store_incoming_message(&self, msg: &HttpMessage) -> Result<(), StoreError> {
        let mut file = File::create(&self.filename)?;
        write_version(&mut file)?;
        write_response_offset(&mut file, 0)?;
        write_message_part(&mut file, msg)?;
        let end = file.stream_position()?;
        file.seek(SeekFrom::Start(STORE_HTTP_RESPONSE_OFFSET))?;
        write_response_offset(&mut file, end as u32)?;
        Ok(())
    }

    /// Appends `msg` as the response half, at the offset recorded by
    /// `store_incoming_message`.
    #[tracing::instrument(skip(self, msg))]
    pub fn store_response_message(&self, msg: &HttpMessage) -> Result<(), StoreError> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.filename)?;
        read_version(&mut file)?;
        skip_to_response(&mut file, false)?;
        write_message_part(&mut file, msg)?;
        Ok(())
    }

    /// Reads the incoming half of the pair.
    #[tracing::instrument(skip(self))]
    pub fn read_incoming_message(&self) -> Result<HttpMessage, StoreError> {
        let mut file = File::open(&self.filename)?;
        read_version(&mut file)?;
        read_response_offset(&mut file)?;
        read_message_part(&mut file)
    }

    /// Reads the response half of the pair, seeking past the incoming
    /// half first. Errors with [`StoreError::NoResponse`] if the file
    /// has no response part yet.
    #[tracing::instrument(skip(self))]
    pub fn read_response_message(&self) -> Result<HttpMessage, StoreError> {
        let mut file = File::open(&self.filename)?;
        read_version(&mut file)?;
        skip_to_response(&mut file, true)?;
        read_message_part(&mut file)
    }
}

fn skip_to_response(file: &mut File, check_presence: bool) -> Result<(), StoreError> {
    let offset = read_response_offset(file)?;
    if check_presence {
        let size = file.metadata()?.len();
        if offset as u64 >= size {
            return Err(StoreError::NoResponse);
        }
    }
    file.seek(SeekFrom::Start(offset as u64)).map_err(|_| StoreError::Response)?;
    Ok(())
}

//
// WRITING: base primitives
//

fn write_tag(w: &mut impl Write, tag: FieldTag) -> Result<(), StoreError> {
    Ok(w.write_u8(tag as u8)?)
}

fn write_string(w: &mut impl Write, s: &str) -> Result<(), StoreError> {
    let bytes = s.as_bytes();
    w.write_u32::<LittleEndian>(bytes.len() as u32)?;
    w.write_all(bytes)?;
    Ok(())
}

fn write_version(w: &mut impl Write) -> Result<(), StoreError> {
    write_tag(w, FieldTag::Version)?;
    Ok(w.write_u16::<LittleEndian>(HTTP_FILE_VERSION)?)
}

fn write_response_offset(w: &mut impl Write, offset: u32) -> Result<(), StoreError> {
    write_tag(w, FieldTag::ResponseOffset)?;
    Ok(w.write_u32::<LittleEndian>(offset)?)
}

//
// WRITING: message part
//

fn write_message_part(w: &mut impl Write, msg: &HttpMessage) -> Result<(), StoreError> {
    write_tag(w, FieldTag::HttpCommand)?;
    w.write_u16::<LittleEndian>(msg.verb.ordinal() as u16)?;

    write_tag(w, FieldTag::Url)?;
    write_string(w, &msg.url.as_ref().map(|u| u.safe_url()).unwrap_or_default())?;

    write_tag(w, FieldTag::HttpStatus)?;
    w.write_u16::<LittleEndian>(msg.status)?;

    write_tag(w, FieldTag::ContentType)?;
    write_string(w, &msg.content_type)?;

    write_tag(w, FieldTag::ContentLength)?;
    w.write_u64::<LittleEndian>(msg.content_length)?;

    write_tag(w, FieldTag::AcceptEncoding)?;
    write_string(w, &msg.accept_encoding)?;

    write_tag(w, FieldTag::VerbTunnel)?;
    w.write_u8(msg.verb_tunnel as u8)?;

    write_tag(w, FieldTag::SendBom)?;
    w.write_u8(msg.send_bom as u8)?;

    write_tag(w, FieldTag::Cookies)?;
    w.write_u16::<LittleEndian>(msg.cookies.len() as u16)?;
    for cookie in msg.cookies.iter() {
        write_string(w, &cookie.set_cookie_text())?;
    }

    write_tag(w, FieldTag::Referrer)?;
    write_string(w, &msg.referrer)?;

    write_tag(w, FieldTag::Desktop)?;
    w.write_u32::<LittleEndian>(msg.remote_desktop)?;

    write_tag(w, FieldTag::Headers)?;
    w.write_u16::<LittleEndian>(msg.headers.len() as u16)?;
    for (name, value) in msg.headers.iter() {
        write_string(w, name)?;
        write_string(w, value)?;
    }

    write_tag(w, FieldTag::Routing)?;
    w.write_u16::<LittleEndian>(msg.routing.len() as u16)?;
    for route in &msg.routing {
        write_string(w, route)?;
    }

    write_tag(w, FieldTag::IsModified)?;
    w.write_u8(msg.use_if_modified_since as u8)?;

    write_tag(w, FieldTag::SystemTime)?;
    write_system_time(w, msg.system_time)?;

    write_tag(w, FieldTag::Body)?;
    let body = msg.body.get_buffer();
    w.write_u64::<LittleEndian>(body.len() as u64)?;
    if !body.is_empty() {
        w.write_all(body)?;
    }

    write_tag(w, FieldTag::EndMarker)?;
    Ok(w.write_u16::<LittleEndian>(END_MARKER)?)
}

fn write_system_time(w: &mut impl Write, time: Option<OffsetDateTime>) -> Result<(), StoreError> {
    let fields = match time {
        Some(t) => [
            t.year().max(0) as u16,
            u8::from(t.month()) as u16,
            t.weekday().number_days_from_sunday() as u16,
            t.day() as u16,
            t.hour() as u16,
            t.minute() as u16,
            t.second() as u16,
            t.millisecond(),
        ],
        None => [0; 8],
    };
    for field in fields {
        w.write_u16::<LittleEndian>(field)?;
    }
    Ok(())
}

//
// READING: base primitives
//

fn read_header(r: &mut impl Read) -> Result<u8, StoreError> {
    Ok(r.read_u8()?)
}

fn read_string(r: &mut impl Read) -> Result<String, StoreError> {
    let length = r.read_u32::<LittleEndian>()? as usize;
    if length == 0 {
        return Ok(String::new());
    }
    let mut buf = vec![0u8; length];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn read_version(r: &mut impl Read) -> Result<u16, StoreError> {
    if read_header(r)? != FieldTag::Version as u8 {
        return Err(StoreError::Version);
    }
    let version = r.read_u16::<LittleEndian>()?;
    if version != HTTP_FILE_VERSION {
        return Err(StoreError::WrongVersion);
    }
    Ok(version)
}

fn read_response_offset(r: &mut impl Read) -> Result<u32, StoreError> {
    if read_header(r)? != FieldTag::ResponseOffset as u8 {
        return Err(StoreError::ResponseOffset);
    }
    Ok(r.read_u32::<LittleEndian>()?)
}

//
// READING: message part
//

fn read_message_part(r: &mut impl Read) -> Result<HttpMessage, StoreError> {
    let mut msg = HttpMessage::new();
    loop {
        let tag = read_header(r)?;
        let Some(field) = FieldTag::from_ordinal(tag) else {
            return Err(StoreError::UnknownField);
        };
        match field {
            FieldTag::Version | FieldTag::ResponseOffset => return Err(StoreError::UnknownField),
            FieldTag::HttpCommand => {
                let ordinal = r.read_u16::<LittleEndian>()? as u8;
                msg.verb = Verb::from_ordinal(ordinal).unwrap_or_default();
            }
            FieldTag::Url => {
                let url = read_string(r)?;
                if !url.is_empty() {
                    msg.set_url(&url)?;
                }
            }
            FieldTag::HttpStatus => msg.status = r.read_u16::<LittleEndian>()?,
            FieldTag::ContentType => msg.content_type = read_string(r)?,
            FieldTag::ContentLength => msg.content_length = r.read_u64::<LittleEndian>()?,
            FieldTag::AcceptEncoding => msg.accept_encoding = read_string(r)?,
            FieldTag::VerbTunnel => msg.verb_tunnel = r.read_u8()? != 0,
            FieldTag::SendBom => msg.send_bom = r.read_u8()? != 0,
            FieldTag::Cookies => {
                let count = r.read_u16::<LittleEndian>()?;
                for _ in 0..count {
                    let text = read_string(r)?;
                    if let Ok(cookie) = Cookie::from_http(&text) {
                        msg.cookies.add(cookie);
                    }
                }
            }
            FieldTag::Referrer => msg.referrer = read_string(r)?,
            FieldTag::Desktop => msg.remote_desktop = r.read_u32::<LittleEndian>()?,
            FieldTag::Headers => {
                let count = r.read_u16::<LittleEndian>()?;
                for _ in 0..count {
                    let name = read_string(r)?;
                    let value = read_string(r)?;
                    msg.headers.add(name, value);
                }
            }
            FieldTag::Routing => {
                let count = r.read_u16::<LittleEndian>()?;
                for _ in 0..count {
                    msg.routing.push(read_string(r)?);
                }
            }
            FieldTag::IsModified => msg.use_if_modified_since = r.read_u8()? != 0,
            FieldTag::SystemTime => msg.system_time = read_system_time(r)?,
            FieldTag::Body => {
                let length = r.read_u64::<LittleEndian>()? as usize;
                if length > 0 {
                    let mut buf = vec![0u8; length];
                    r.read_exact(&mut buf).map_err(|_| StoreError::Body)?;
                    msg.body = wsfab_http::FileBuffer::from_bytes(buf);
                }
            }
            FieldTag::EndMarker => {
                let check = r.read_u16::<LittleEndian>()?;
                if check != END_MARKER {
                    return Err(StoreError::EndMarker);
                }
                return Ok(msg);
            }
        }
    }
}

fn read_system_time(r: &mut impl Read) -> Result<Option<OffsetDateTime>, StoreError> {
    let mut fields = [0u16; 8];
    for field in fields.iter_mut() {
        *field = r.read_u16::<LittleEndian>()?;
    }
    let [year, month, _dow, day, hour, minute, second, millisecond] = fields;
    if year == 0 && month == 0 && day == 0 {
        return Ok(None);
    }
    let built = Month::try_from(month as u8)
        .ok()
        .and_then(|month| time::Date::from_calendar_date(year as i32, month, day as u8).ok())
        .and_then(|date| {
            date.with_hms_milli(hour as u8, minute as u8, second as u8, millisecond).ok()
        })
        .map(|dt| dt.assume_utc());
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wsfab-store-test-{name}-{}", std::process::id()))
    }

    fn roundtrip(path: &Path, msg: &HttpMessage) -> HttpMessage {
        let store = MessageStore::new(path);
        store.store_incoming_message(msg).unwrap();
        store.read_incoming_message().unwrap()
    }

    #[test]
    fn stores_and_reads_back_an_incoming_message() {
        let path = temp_path("incoming");
        let mut msg = HttpMessage::new();
        msg.verb = Verb::Get;
        msg.set_url("http://h/x").unwrap();
        msg.status = 200;
        msg.body = wsfab_http::FileBuffer::from_bytes(b"hello".to_vec());

        let read_back = roundtrip(&path, &msg);
        assert_eq!(read_back.verb, Verb::Get);
        assert_eq!(read_back.status, 200);
        assert_eq!(read_back.body.get_buffer(), b"hello");
        assert_eq!(read_back.url.unwrap().safe_url(), msg.url.unwrap().safe_url());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn file_starts_with_version_and_response_offset_tags() {
        let path = temp_path("header-bytes");
        let mut msg = HttpMessage::new();
        msg.verb = Verb::Get;
        msg.set_url("http://h/x").unwrap();
        msg.status = 200;
        msg.body = wsfab_http::FileBuffer::from_bytes(b"hello".to_vec());

        let store = MessageStore::new(&path);
        store.store_incoming_message(&msg).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes[0], FieldTag::Version as u8);
        assert_eq!(&bytes[1..3], &HTTP_FILE_VERSION.to_le_bytes());
        assert_eq!(bytes[3], FieldTag::ResponseOffset as u8);
        assert_eq!(bytes[bytes.len() - 2..], END_MARKER.to_le_bytes());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn stores_incoming_then_appends_a_response_and_reads_both_back() {
        let path = temp_path("response-pair");
        let mut incoming = HttpMessage::new();
        incoming.verb = Verb::Post;
        incoming.set_url("http://h/create").unwrap();

        let mut response = HttpMessage::new();
        response.verb = Verb::Response;
        response.status = 201;
        response.body = wsfab_http::FileBuffer::from_bytes(b"created".to_vec());

        let store = MessageStore::new(&path);
        store.store_incoming_message(&incoming).unwrap();
        store.store_response_message(&response).unwrap();

        let read_incoming = store.read_incoming_message().unwrap();
        assert_eq!(read_incoming.verb, Verb::Post);

        let read_response = store.read_response_message().unwrap();
        assert_eq!(read_response.status, 201);
        assert_eq!(read_response.body.get_buffer(), b"created");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reading_the_response_half_before_it_exists_is_an_error() {
        let path = temp_path("no-response-yet");
        let mut incoming = HttpMessage::new();
        incoming.verb = Verb::Get;
        incoming.set_url("http://h/x").unwrap();

        let store = MessageStore::new(&path);
        store.store_incoming_message(&incoming).unwrap();

        assert!(matches!(store.read_response_message(), Err(StoreError::NoResponse)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn cookies_headers_and_routing_round_trip() {
        let path = temp_path("cookies-headers-routing");
        let mut msg = HttpMessage::new();
        msg.verb = Verb::Get;
        msg.set_url("http://h/x").unwrap();
        msg.cookies.add(Cookie::new("sid", "abc123").unwrap());
        msg.headers.add("X-Trace", "1");
        msg.set_routing("/a/b/c");

        let read_back = roundtrip(&path, &msg);
        assert_eq!(read_back.cookies.get_by_name("sid").unwrap().value, "abc123");
        assert_eq!(read_back.headers.get("X-Trace"), Some("1"));
        assert_eq!(read_back.routing, vec!["a", "b", "c"]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn a_damaged_end_marker_is_rejected() {
        let path = temp_path("damaged-end-marker");
        let mut msg = HttpMessage::new();
        msg.verb = Verb::Get;
        msg.set_url("http://h/x").unwrap();

        let store = MessageStore::new(&path);
        store.store_incoming_message(&msg).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let len = bytes.len();
        bytes[len - 1] = 0x00;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(store.read_incoming_message(), Err(StoreError::EndMarker)));
        std::fs::remove_file(&path).ok();
    }
}
