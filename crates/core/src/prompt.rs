/// Column headers the model is asked to produce, in order.
pub const REFERENCE_COLUMNS: [&str; 4] = ["Anime Title", "Timestamp", "Excited?", "Notes"];

/// Prompt asking for a markdown table of every anime referenced in `transcript`.
///
/// `timestamps` is the pre-formatted block from the video description and may
/// be empty.
pub fn reference_table_prompt(transcript: &str, timestamps: &str) -> String {
    format!(
        r#"This is a subtitles file from a YouTube anime review channel. Make me a table with the columns:
{columns}

Use "Excited?" to say whether the host is visibly excited about the anime (Yes/No).

transcript:
{transcript}

here are some timestamps for your reference:
{timestamps}

Note: just give a table in markdown, nothing else. I will be saving this as CSV, so only give the markdown table."#,
        columns = REFERENCE_COLUMNS.join(", "),
        transcript = transcript,
        timestamps = timestamps,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_inputs_verbatim() {
        let prompt = reference_table_prompt("line one\nline two", "0:00 - Intro\n");
        assert!(prompt.contains("transcript:\nline one\nline two\n"));
        assert!(prompt.contains("0:00 - Intro\n"));
        assert!(prompt.contains("Anime Title, Timestamp, Excited?, Notes"));
        assert!(prompt.contains("only give the markdown table"));
    }
}
