//! Helpers shared by the outbound HTTP collaborators.

use std::fmt::Display;

/// Body of a non-success upstream response, for error details.
///
/// A body that cannot be read still produces a detail naming the read failure,
/// so an error response never reaches the log with a blank body.
pub async fn error_body(response: reqwest::Response) -> String {
    describe_body(response.text().await)
}

fn describe_body<E: Display>(read: Result<String, E>) -> String {
    match read {
        Ok(body) => body,
        Err(err) => format!("<unreadable response body: {err}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_body_is_kept_verbatim() {
        assert_eq!(
            describe_body(Ok::<_, String>("quota exceeded".to_string())),
            "quota exceeded"
        );
        assert_eq!(describe_body(Ok::<_, String>(String::new())), "");
    }

    #[test]
    fn read_failure_is_named_in_the_detail() {
        let detail = describe_body(Err::<String, _>("connection reset by peer"));
        assert_eq!(
            detail,
            "<unreadable response body: connection reset by peer>"
        );
    }
}
