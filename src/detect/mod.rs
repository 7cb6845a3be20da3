// Input classification: document families, export filters, content types.

pub mod doc_type;
