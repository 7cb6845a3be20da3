// Document family detection from file names, plus the content-type
// allow-list checked before a file may be staged for conversion.

/// Coarse document category used to select a PDF export filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFamily {
    Writer,
    Calc,
    Impress,
    Draw,
}

impl DocumentFamily {
    /// Classify a file extension, case-insensitively. Word-processing
    /// extensions and anything unrecognized fall back to `Writer`, which is
    /// the engine's default import path.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" | "xls" | "ods" => DocumentFamily::Calc,
            "pptx" | "ppt" | "odp" => DocumentFamily::Impress,
            "odg" => DocumentFamily::Draw,
            _ => DocumentFamily::Writer,
        }
    }

    /// Classify by the extension of a full file name.
    pub fn from_file_name(name: &str) -> Self {
        Self::from_extension(file_extension(name))
    }

    /// The engine-side PDF export filter for this family.
    pub fn pdf_export_filter(&self) -> &'static str {
        match self {
            DocumentFamily::Writer => "writer_pdf_Export",
            DocumentFamily::Calc => "calc_pdf_Export",
            DocumentFamily::Impress => "impress_pdf_Export",
            DocumentFamily::Draw => "draw_pdf_Export",
        }
    }
}

/// Extension of a file name, without the dot. Empty when there is none.
pub fn file_extension(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

/// Stem of a file name: everything before the final extension.
pub fn file_stem(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

/// Content types accepted for conversion.
const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document", // .docx
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",       // .xlsx
    "application/vnd.openxmlformats-officedocument.presentationml.presentation", // .pptx
    "application/msword",                                                      // .doc
    "application/vnd.ms-excel",                                                // .xls
    "application/vnd.ms-powerpoint",                                           // .ppt
    "application/vnd.oasis.opendocument.text",                                 // .odt
    "application/vnd.oasis.opendocument.spreadsheet",                          // .ods
    "application/vnd.oasis.opendocument.presentation",                         // .odp
];

/// Whether a declared content type may be submitted for conversion.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}
