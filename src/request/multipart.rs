use uuid::Uuid;

/// One part of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartSection {
    /// Plain form field
    Field { name: String, value: String },
    /// File upload with an optional content type
    File {
        name: String,
        filename: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl MultipartSection {
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        Self::File {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Field { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Encoded multipart body and the `Content-Type` header that announces it
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Encode `sections` with a fresh random boundary
pub fn encode_multipart(sections: &[MultipartSection]) -> MultipartBody {
    let boundary = format!("frame-request-{}", Uuid::new_v4().simple());
    encode_multipart_with_boundary(sections, boundary)
}

pub fn encode_multipart_with_boundary(
    sections: &[MultipartSection],
    boundary: impl Into<String>,
) -> MultipartBody {
    let boundary = boundary.into();
    let mut bytes = Vec::new();

    for section in sections {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        let mut disposition =
            format!("Content-Disposition: form-data; name=\"{}\"", escape(section.name()));
        match section {
            MultipartSection::Field { value, .. } => {
                disposition.push_str("\r\n\r\n");
                bytes.extend_from_slice(disposition.as_bytes());
                bytes.extend_from_slice(value.as_bytes());
            }
            MultipartSection::File {
                filename,
                content_type,
                bytes: data,
                ..
            } => {
                disposition.push_str(&format!("; filename=\"{}\"\r\n", escape(filename)));
                if let Some(content_type) = content_type {
                    disposition.push_str(&format!("Content-Type: {content_type}\r\n"));
                }
                disposition.push_str("\r\n");
                bytes.extend_from_slice(disposition.as_bytes());
                bytes.extend_from_slice(data);
            }
        }
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    MultipartBody { boundary, bytes }
}

/// Quotes and line breaks would end the quoted parameter early.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
