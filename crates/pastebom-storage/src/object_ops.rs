//! object_store plumbing shared by the S3 and in-memory backends.

use crate::traits::{StorageError, Visibility};
use object_store::{
    Attribute, AttributeValue, Attributes, Error as ObjectStoreError, GetOptions, PutOptions,
    TagSet,
};

/// Tag and user-metadata key carrying the visibility class of an object.
pub(crate) const VISIBILITY_KEY: &str = "visibility";

/// Put options carrying content type and visibility.
///
/// Visibility is always written as user metadata. With `tagging` it is also written as an
/// object tag, which bucket policies can match on to grant anonymous reads.
pub(crate) fn put_options(content_type: &str, visibility: Visibility, tagging: bool) -> PutOptions {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from(content_type.to_string()),
    );
    attributes.insert(
        Attribute::Metadata(VISIBILITY_KEY.into()),
        AttributeValue::from(visibility.as_str()),
    );

    let mut opts = PutOptions::default();
    opts.attributes = attributes;
    if tagging {
        let mut tags = TagSet::default();
        tags.push(VISIBILITY_KEY, visibility.as_str());
        opts.tags = tags;
    }
    opts
}

/// Options for a metadata-only read.
pub(crate) fn head_options() -> GetOptions {
    let mut opts = GetOptions::default();
    opts.head = true;
    opts
}

/// Visibility recorded on an object, if any.
pub(crate) fn visibility_of(attributes: &Attributes) -> Option<Visibility> {
    attributes
        .get(&Attribute::Metadata(VISIBILITY_KEY.into()))
        .and_then(|value| Visibility::parse(value.as_ref()))
}

/// Map a read failure, keeping "not found" distinct from every other error.
pub(crate) fn map_read_error(storage_key: &str, err: ObjectStoreError) -> StorageError {
    match err {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
        other => StorageError::DownloadFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_options_record_visibility() {
        let opts = put_options("text/html; charset=utf-8", Visibility::Public, false);
        assert_eq!(visibility_of(&opts.attributes), Some(Visibility::Public));
        assert_eq!(
            opts.attributes
                .get(&Attribute::ContentType)
                .map(|v| v.as_ref().to_string()),
            Some("text/html; charset=utf-8".to_string())
        );
    }

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = ObjectStoreError::NotFound {
            path: "boms/x.html".to_string(),
            source: "missing".into(),
        };
        assert!(map_read_error("boms/x.html", err).is_not_found());

        let err = ObjectStoreError::Generic {
            store: "S3",
            source: "connection reset".into(),
        };
        assert!(matches!(
            map_read_error("boms/x.html", err),
            StorageError::DownloadFailed(_)
        ));
    }
}
