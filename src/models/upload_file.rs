//! 待上传文件与提交前校验

use crate::config::Config;
use crate::error::ValidationError;
use std::path::Path;

/// 待上传文件
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// 根据文件名推断内容类型
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    /// 指定内容类型
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// 提交前校验
///
/// 规则：扩展名在白名单内、内容类型与扩展名一致、非空、不超过大小上限。
#[derive(Debug, Clone)]
pub struct FileValidator {
    allowed_extensions: Vec<String>,
    max_bytes: u64,
}

impl FileValidator {
    pub fn new(allowed_extensions: Vec<String>, max_bytes: u64) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.allowed_extensions.clone(), config.max_upload_bytes)
    }

    pub fn validate(&self, file: &UploadFile) -> Result<(), ValidationError> {
        if file.filename.trim().is_empty() {
            return Err(ValidationError::MissingFilename);
        }

        let allowed = file
            .extension()
            .filter(|ext| self.allowed_extensions.iter().any(|a| a == ext))
            .map(|ext| {
                let expected = mime_guess::from_ext(&ext).first_or_octet_stream();
                file.content_type.eq_ignore_ascii_case(expected.essence_str())
            })
            .unwrap_or(false);
        if !allowed {
            return Err(ValidationError::UnsupportedType {
                filename: file.filename.clone(),
                content_type: file.content_type.clone(),
            });
        }

        if file.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                filename: file.filename.clone(),
            });
        }

        if file.size() > self.max_bytes {
            return Err(ValidationError::TooLarge {
                filename: file.filename.clone(),
                size: file.size(),
                limit: self.max_bytes,
            });
        }

        Ok(())
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_is_accepted() {
        let file = UploadFile::new("Resume.PDF", b"%PDF-1.4".to_vec());
        assert_eq!(file.content_type, "application/pdf");
        assert!(FileValidator::default().validate(&file).is_ok());
    }

    #[test]
    fn test_non_pdf_is_rejected() {
        let file = UploadFile::new("resume.docx", b"PK".to_vec());
        let err = FileValidator::default().validate(&file).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
        assert!(err.to_string().contains("不是 PDF 文件"));
    }

    #[test]
    fn test_mismatched_content_type_is_rejected() {
        let file = UploadFile::new("resume.pdf", b"%PDF".to_vec()).with_content_type("text/plain");
        assert!(matches!(
            FileValidator::default().validate(&file),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_empty_and_oversized_files_are_rejected() {
        let validator = FileValidator::new(vec![".pdf".to_string()], 4);

        let empty = UploadFile::new("empty.pdf", Vec::new());
        assert!(matches!(
            validator.validate(&empty),
            Err(ValidationError::EmptyFile { .. })
        ));

        let big = UploadFile::new("big.pdf", vec![0u8; 5]);
        assert!(matches!(
            validator.validate(&big),
            Err(ValidationError::TooLarge { size: 5, limit: 4, .. })
        ));
    }
}
