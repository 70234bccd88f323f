//! Method-call dispatcher
//!
//! Maps a method name plus a JSON key/value argument map onto the service.
//! Names and argument keys follow the channel protocol clients already speak:
//!
//! | Method            | Arguments                                              |
//! |-------------------|--------------------------------------------------------|
//! | `openPDF`         | `path`                                                 |
//! | `closePDF`        | `pdf`                                                  |
//! | `openPDFPage`     | `pdf`, `page`                                          |
//! | `closePDFPage`    | `pdf`, `page`                                          |
//! | `getPDFPageCount` | `pdf` or `path`                                        |
//! | `getPDFPageSize`  | `pdf` or `path`, `page`                                |
//! | `renderPDFPage`   | `pdf` or `path`, `page`, `x`, `y`, `width`, `height`, `scale`?, `background`? |
//!
//! Passing `path` instead of `pdf` opens the file for the duration of the
//! call only.

use serde_json::{json, Map, Value};

use crate::error::{RasterError, Result};
use crate::geometry::CropRect;
use crate::native::PdfBackend;
use crate::raster::RenderRequest;
use crate::service::{EncodedPage, RenderService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    OpenPdf,
    ClosePdf,
    OpenPdfPage,
    ClosePdfPage,
    GetPdfPageCount,
    GetPdfPageSize,
    RenderPdfPage,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "openPDF" => Method::OpenPdf,
            "closePDF" => Method::ClosePdf,
            "openPDFPage" => Method::OpenPdfPage,
            "closePDFPage" => Method::ClosePdfPage,
            "getPDFPageCount" => Method::GetPdfPageCount,
            "getPDFPageSize" => Method::GetPdfPageSize,
            "renderPDFPage" => Method::RenderPdfPage,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::OpenPdf => "openPDF",
            Method::ClosePdf => "closePDF",
            Method::OpenPdfPage => "openPDFPage",
            Method::ClosePdfPage => "closePDFPage",
            Method::GetPdfPageCount => "getPDFPageCount",
            Method::GetPdfPageSize => "getPDFPageSize",
            Method::RenderPdfPage => "renderPDFPage",
        }
    }
}

/// Successful reply to a method call
#[derive(Debug)]
pub enum MethodReply {
    Value(Value),
    Image(EncodedPage),
}

/// Typed view over a JSON argument map
struct Args<'a>(&'a Map<String, Value>);

impl<'a> Args<'a> {
    fn new(value: &'a Value) -> Result<Self> {
        value.as_object().map(Args).ok_or_else(|| {
            RasterError::BadArguments("Arguments have to be a key/value map".to_string())
        })
    }

    fn has(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(|v| !v.is_null())
    }

    fn int(&self, name: &str) -> Result<i64> {
        self.0
            .get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| RasterError::MissingArgument(name.to_string()))
    }

    fn string(&self, name: &str) -> Result<String> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RasterError::MissingArgument(name.to_string()))
    }

    fn opt_number(&self, name: &str) -> Result<Option<f64>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| {
                RasterError::BadArguments(format!("Argument {} must be a number", name))
            }),
        }
    }

    fn opt_string(&self, name: &str) -> Result<Option<String>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(RasterError::BadArguments(format!(
                "Argument {} must be a string",
                name
            ))),
        }
    }

    fn render_request(&self) -> Result<RenderRequest> {
        let crop = CropRect::new(
            self.int("x")?,
            self.int("y")?,
            self.int("width")?,
            self.int("height")?,
        );
        let mut request = RenderRequest::new(crop);
        if let Some(scale) = self.opt_number("scale")? {
            request.scale = scale;
        }
        request.background = self.opt_string("background")?;
        Ok(request)
    }
}

/// Where a call's document comes from
enum Target {
    Handle(i64),
    Path(String),
}

fn target(args: &Args<'_>) -> Result<Target> {
    if !args.has("pdf") && args.has("path") {
        return args.string("path").map(Target::Path);
    }
    args.int("pdf").map(Target::Handle)
}

/// Run one method call against the service
pub async fn dispatch<B: PdfBackend>(
    service: &RenderService<B>,
    method: Method,
    arguments: &Value,
) -> Result<MethodReply> {
    let args = Args::new(arguments)?;

    let value = match method {
        Method::OpenPdf => json!(service.open_document(args.string("path")?).await?),
        Method::ClosePdf => json!(service.close_document(args.int("pdf")?).await?),
        Method::OpenPdfPage => {
            let handle = args.int("pdf")?;
            json!(service.open_page(handle, args.int("page")?).await?)
        }
        Method::ClosePdfPage => {
            let handle = args.int("pdf")?;
            json!(service.close_page(handle, args.int("page")?).await?)
        }
        Method::GetPdfPageCount => match target(&args)? {
            Target::Handle(handle) => json!(service.page_count(handle).await?),
            Target::Path(path) => json!(service.page_count_of(path).await?),
        },
        Method::GetPdfPageSize => {
            let target = target(&args)?;
            let page = args.int("page")?;
            match target {
                Target::Handle(handle) => json!(service.page_size(handle, page).await?),
                Target::Path(path) => json!(service.page_size_of(path, page).await?),
            }
        }
        Method::RenderPdfPage => {
            let target = target(&args)?;
            let page = args.int("page")?;
            let request = args.render_request()?;
            let encoded = match target {
                Target::Handle(handle) => service.render_png(handle, page, request).await?,
                Target::Path(path) => service.render_file_png(path, page, request).await?,
            };
            return Ok(MethodReply::Image(encoded));
        }
    };

    Ok(MethodReply::Value(value))
}
