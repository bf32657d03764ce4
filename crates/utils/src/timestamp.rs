//! Timestamp formatting for image names.

use chrono::{DateTime, Utc};

/// The layout appended to user-chosen image names. Underscores instead
/// of colons because EC2 rejects colons in AMI names.
const IMAGE_NAME_LAYOUT: &str = "%Y-%m-%d at %H_%M_%S (UTC)";

/// Render `t` in the image-name timestamp layout.
pub fn image_name_timestamp(t: DateTime<Utc>) -> String {
    t.format(IMAGE_NAME_LAYOUT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_image_name_timestamp() {
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 42).unwrap();
        assert_eq!(image_name_timestamp(t), "2024-03-09 at 17_05_42 (UTC)");
    }
}
