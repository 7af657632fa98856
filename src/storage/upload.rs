use axum::http::HeaderMap;
use bytes::Bytes;

/// The file part of a multipart artifact upload.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// Pull the `file` part out of a multipart body. Other parts are ignored.
pub async fn parse_file_upload(headers: &HeaderMap, body: Bytes) -> Result<UploadedFile, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "Uploaded file has no name".to_string())?;
        let data = field
            .bytes()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        return Ok(UploadedFile {
            file_name,
            data,
        });
    }

    Err("No file was submitted".to_string())
}
