//! Host objects
//!
//! Kinds supplied by the embedding environment (geometry, media and file-like
//! types). The model never inspects their internals; it only needs the tag
//! they report and whether they can produce an independent duplicate.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Closed set of recognized host kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostTag {
    /// `DOMPoint`
    DomPoint,
    /// `DOMPointReadOnly`
    DomPointReadOnly,
    /// `DOMRect`
    DomRect,
    /// `DOMRectReadOnly`
    DomRectReadOnly,
    /// `DOMQuad`
    DomQuad,
    /// `DOMMatrix`
    DomMatrix,
    /// `DOMMatrixReadOnly`
    DomMatrixReadOnly,
    /// `Blob`
    Blob,
    /// `File`
    File,
    /// `FileList`
    FileList,
    /// `ImageData`
    ImageData,
    /// `ImageBitmap`
    ImageBitmap,
    /// A host kind outside the recognized set, identified by its constructor name
    Other(&'static str),
}

impl HostTag {
    /// Every recognized host tag
    pub const ALL: [HostTag; 12] = [
        HostTag::DomPoint,
        HostTag::DomPointReadOnly,
        HostTag::DomRect,
        HostTag::DomRectReadOnly,
        HostTag::DomQuad,
        HostTag::DomMatrix,
        HostTag::DomMatrixReadOnly,
        HostTag::Blob,
        HostTag::File,
        HostTag::FileList,
        HostTag::ImageData,
        HostTag::ImageBitmap,
    ];

    /// Constructor name
    pub fn name(&self) -> &'static str {
        match self {
            HostTag::DomPoint => "DOMPoint",
            HostTag::DomPointReadOnly => "DOMPointReadOnly",
            HostTag::DomRect => "DOMRect",
            HostTag::DomRectReadOnly => "DOMRectReadOnly",
            HostTag::DomQuad => "DOMQuad",
            HostTag::DomMatrix => "DOMMatrix",
            HostTag::DomMatrixReadOnly => "DOMMatrixReadOnly",
            HostTag::Blob => "Blob",
            HostTag::File => "File",
            HostTag::FileList => "FileList",
            HostTag::ImageData => "ImageData",
            HostTag::ImageBitmap => "ImageBitmap",
            HostTag::Other(name) => name,
        }
    }

    /// Parse a recognized constructor name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for HostTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability surface of an externally supplied kind
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Which host kind this is
    fn host_tag(&self) -> HostTag;

    /// Produce an independent copy of the host state, if the kind supports it
    fn duplicate(&self) -> Option<Arc<dyn HostObject>>;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}
