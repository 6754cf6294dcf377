//! Copy-editing instructions sent with every chunk.

/// Marker replaced by the chunk text.
const TEXT_PLACEHOLDER: &str = "{text}";

const EDIT_PROMPT_TEMPLATE: &str = "\
Please act as a professional copy editor. Edit the following text according to these rules:
1. Follow the Chicago Manual of Style for writing numbers, capitalization, headers, and punctuation
2. Correct any obvious factual mistakes or inconsistencies
3. Maintain the original voice and style of the writing
4. Format quotes as ASCII directional quotes
5. Fix spelling, grammar, and punctuation errors
6. Only make necessary changes - do not rewrite content that is already correct

Here is the text to edit:

{text}

Please provide only the edited text without any explanations or comments.";

/// Build the full prompt for one chunk. The chunk is inserted verbatim.
pub fn build_edit_prompt(text: &str) -> String {
    // Only the template's own placeholder is substituted
    EDIT_PROMPT_TEMPLATE.replacen(TEXT_PLACEHOLDER, text, 1)
}
