//! HTTP/1.1 wire encoding for one `Connection: close` exchange.

use crate::error::Error;
use crate::types::{Headers, Method, Request, Response, Status, header};
use crate::url::Target;
use memchr::memmem;
use std::io::{self, Read};

const READ_CHUNK: usize = 8 * 1024;
const MAX_HEAD: usize = 64 * 1024;

/// Headers the client always writes itself.
const RESERVED: [&str; 4] = ["host", "content-length", "connection", "transfer-encoding"];

pub(crate) fn encode_request(request: &Request, target: &Target) -> Vec<u8> {
    let body = if request.method.uploads() {
        request.body.as_deref()
    } else {
        None
    };

    let mut head = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\n",
        request.method,
        target.path,
        target.host_header()
    );
    for (name, value) in &request.headers {
        if RESERVED.iter().any(|reserved| name.eq_ignore_ascii_case(reserved)) {
            continue;
        }
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    if request.method.uploads() {
        head.push_str(&format!("Content-Length: {}\r\n", body.map_or(0, <[u8]>::len)));
    }
    head.push_str("Connection: close\r\n\r\n");

    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body.unwrap_or_default());
    bytes
}

pub(crate) fn read_response<R: Read>(reader: &mut R, method: Method) -> Result<Response, Error> {
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let head_end = loop {
        if let Some(at) = memmem::find(&buf, b"\r\n\r\n") {
            break at;
        }
        if buf.len() > MAX_HEAD {
            return Err(Error::Malformed("response head too large"));
        }
        if fill(reader, &mut buf)? == 0 {
            return Err(Error::Malformed("connection closed inside response head"));
        }
    };

    let (status, headers) = parse_head(&buf[..head_end])?;
    let rest = buf.split_off(head_end + 4);
    let body = if method.downloads() && carries_body(status.code) {
        Some(read_body(reader, &headers, rest)?)
    } else {
        None
    };
    Ok(Response {
        status,
        headers,
        body,
    })
}

fn fill<R: Read>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let mut chunk = [0_u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                return Ok(n);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
}

fn parse_head(head: &[u8]) -> Result<(Status, Headers), Error> {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");

    let mut status_line = lines.next().unwrap_or_default().splitn(3, ' ');
    let version = status_line.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(Error::Malformed("status line"));
    }
    let code = status_line
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .filter(|code| (100..1000).contains(code))
        .ok_or(Error::Malformed("status code"))?;
    let reason = status_line.next().unwrap_or_default().trim();

    let mut headers = Vec::new();
    for line in lines.filter(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or(Error::Malformed("header line"))?;
        headers.push((name.trim().to_owned(), value.trim().to_owned()));
    }
    Ok((Status::new(code, reason), headers))
}

const fn carries_body(code: u16) -> bool {
    !matches!(code, 100..=199 | 204 | 304)
}

fn read_body<R: Read>(reader: &mut R, headers: &Headers, mut buf: Vec<u8>) -> Result<Vec<u8>, Error> {
    let chunked = header(headers, "transfer-encoding")
        .is_some_and(|coding| coding.to_ascii_lowercase().contains("chunked"));
    if chunked {
        return decode_chunked(reader, buf);
    }

    if let Some(length) = header(headers, "content-length") {
        let length: usize = length
            .parse()
            .map_err(|_| Error::Malformed("content-length"))?;
        while buf.len() < length {
            if fill(reader, &mut buf)? == 0 {
                return Err(Error::Malformed("body shorter than content-length"));
            }
        }
        buf.truncate(length);
        return Ok(buf);
    }

    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

fn decode_chunked<R: Read>(reader: &mut R, mut buf: Vec<u8>) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    let mut pos = 0;
    loop {
        let line_end = loop {
            if let Some(at) = memmem::find(&buf[pos..], b"\r\n") {
                break pos + at;
            }
            if fill(reader, &mut buf)? == 0 {
                return Err(Error::Malformed("truncated chunk size"));
            }
        };
        let size_line = String::from_utf8_lossy(&buf[pos..line_end]);
        let size_text = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_text, 16)
            .map_err(|_| Error::Malformed("chunk size"))?;
        pos = line_end + 2;
        if size == 0 {
            return Ok(body);
        }

        let data_end = pos.checked_add(size).ok_or(Error::Malformed("chunk size"))?;
        let chunk_end = data_end.checked_add(2).ok_or(Error::Malformed("chunk size"))?;
        while buf.len() < chunk_end {
            if fill(reader, &mut buf)? == 0 {
                return Err(Error::Malformed("truncated chunk"));
            }
        }
        body.extend_from_slice(&buf[pos..data_end]);
        if &buf[data_end..chunk_end] != b"\r\n" {
            return Err(Error::Malformed("chunk terminator"));
        }
        pos = chunk_end;
    }
}
