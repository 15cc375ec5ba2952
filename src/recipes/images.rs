use anyhow::Context;
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::recipes::repo::Recipe;
use crate::state::AppState;

/// Fixed prefix all recipe images are stored under.
const KEY_PREFIX: &str = "recipes";

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Extension from the uploaded filename, when it looks like one.
pub fn ext_from_filename(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Object key: random identifier plus the original extension, under the
/// fixed upload prefix.
pub fn image_key(user_id: Uuid, ext: &str) -> String {
    format!("{KEY_PREFIX}/{user_id}/{}.{ext}", Uuid::new_v4())
}

/// Upload the image, point the recipe at it and drop the replaced object.
pub async fn store_recipe_image(
    state: &AppState,
    recipe: &Recipe,
    body: Bytes,
    content_type: &str,
    filename: Option<&str>,
) -> Result<String, ApiError> {
    let ext = filename
        .and_then(ext_from_filename)
        .or_else(|| ext_from_mime(content_type).map(String::from))
        .ok_or_else(|| ApiError::validation("unsupported image type"))?;

    let key = image_key(recipe.user_id, &ext);
    state
        .storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {key}"))?;

    let old = Recipe::swap_image_key(&state.db, recipe.user_id, recipe.id, &key)
        .await?
        .ok_or_else(|| ApiError::not_found("recipe not found"))?;

    // Replaced objects are orphaned otherwise; losing one is harmless
    if let Some(old_key) = old {
        if let Err(e) = state.storage.delete_object(&old_key).await {
            warn!(error = %e, key = %old_key, "failed to delete replaced image");
        }
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_mapping_covers_common_images() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn filename_extension_is_lowercased_and_sanity_checked() {
        assert_eq!(ext_from_filename("dinner.JPG"), Some("jpg".into()));
        assert_eq!(ext_from_filename("photo.png"), Some("png".into()));
        assert_eq!(ext_from_filename("noext"), None);
        assert_eq!(ext_from_filename("trailing."), None);
        assert_eq!(ext_from_filename("weird.../../x"), None);
    }

    #[test]
    fn keys_are_unique_and_keep_the_extension() {
        let user = Uuid::new_v4();
        let a = image_key(user, "jpg");
        let b = image_key(user, "jpg");
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("recipes/{user}/")));
        assert!(a.ends_with(".jpg"));
    }
}
