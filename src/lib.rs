/*!
# MecSimCalc helpers

Helper functions for web-based calculation apps, written in Rust.

## Overview

Apps receive file uploads as base64 data URIs and return HTML snippets to the
browser. This crate covers both directions: it turns uploads back into in-memory
files, images and tables, and it renders images, plots, animations, tables and
text as HTML with optional download links embedded as data URIs. It also delivers
quiz results to a spreadsheet or by e-mail.

## Architecture

### Payload Codec
- **Technologies**: base64, regex, mime_guess
- A payload looks like `data:<type>/<subtype>;base64,<body>`
- `codec::decode` splits on the first `;base64,` and decodes the body into a
  seekable buffer; a missing separator is `CodecError::InvalidFormat`
- `codec::classify` maps metadata to a short file-type label (`jpeg`, `csv`,
  `xlsx`, ...), returning an empty label instead of failing

### Rendering Layer (`render` feature)
- **Technologies**: image, plotters, csv, calamine, rust_xlsxwriter
- **Key Components**:
  - Images - decode uploads, thumbnail for display, full-size download
  - Tables - CSV-then-Excel loading, HTML tables, CSV/XLSX downloads
  - Plots - explicit `Figure` handles rendered to PNG, GIF animations
  - Text - plain-text download links

### Quiz Delivery (`quiz` feature)
- **Technologies**: reqwest, jsonwebtoken, lettre
- Spreadsheet append through a service-account token exchange
- Best-effort e-mail over implicit-TLS SMTP

## Modules

- **codec**: payload decoding, file-type labels, extensions, data-URI encoding
- **html**: shared snippet type and tag helpers
- **text**: text download links
- **geometry**: plane geometry used by the drawing helpers
- **images**: image decoding and rendering
- **tables**: table model and HTML rendering
- **loader**: loading uploaded tables (CSV, then Excel)
- **downloader**: table export (CSV, XLSX) and rendering with download links
- **plot**: figures, plots and animations
- **config**: delivery endpoints and service-account credentials
- **sheets**: spreadsheet append client
- **mailer**: e-mail delivery
- **error**: error types

## Usage

```
use mecsimcalc::codec::{classify, decode_with_metadata};

let (file, metadata) = decode_with_metadata("data:text/csv;base64,YSxiCjEsMgo=").unwrap();
assert_eq!(classify(&metadata), "csv");
assert_eq!(file.into_inner(), b"a,b\n1,2\n");
```
*/

pub mod codec;
pub mod config;
pub mod error;
pub mod geometry;
pub mod html;
pub mod text;

#[cfg(feature = "render")]
pub mod downloader;
#[cfg(feature = "render")]
pub mod images;
#[cfg(feature = "render")]
pub mod loader;
#[cfg(feature = "render")]
pub mod plot;
#[cfg(feature = "render")]
pub mod tables;

#[cfg(feature = "quiz")]
pub mod mailer;
#[cfg(feature = "quiz")]
pub mod sheets;

/// Re-export the everyday entry points to make them easier to use
pub use codec::{classify, decode, decode_with_extension, decode_with_metadata, encode};
pub use error::*;
pub use html::RenderedHtml;
pub use text::text_download_link;

#[cfg(feature = "render")]
pub use downloader::{TableOptions, render_table};
#[cfg(feature = "render")]
pub use images::{ImageOptions, LoadedImage, decode_image, render_image};
#[cfg(feature = "render")]
pub use loader::{file_to_table, input_to_table};
#[cfg(feature = "render")]
pub use plot::{ArrowLabel, AxesOptions, Figure, PlotOptions, render_animation, render_plot};
#[cfg(feature = "render")]
pub use tables::{CellValue, Table};

#[cfg(feature = "quiz")]
pub use mailer::send_results_email;
#[cfg(feature = "quiz")]
pub use sheets::{AppendOptions, SheetsClient, append_to_sheet};
