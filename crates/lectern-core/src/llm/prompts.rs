//! Prompt text for every model call the pipeline makes.

/// Per-page instructions for PDF parsing. The page itself travels as an
/// attached single-page PDF file.
pub const PDF_PAGE_PROMPT: &str = r#"Parse this page from an academic paper and extract it into the specified JSON structure.

1. If there is document metadata on the page (title, authors, publication date, publication, doi, abstract), extract those into the "metadata" object.

2. Extract the main textual content of the page.
	- Use markdown syntax to format the text.
	- This should exclude any headers, footers, image captions, tables, and any other elements not part of the main content.
	- Any columns should be concatenated in normal reading order.
	- Footnote or endnote references (normally as superscripts) should be included in the main text using square brackets eg. [1].
	- Try to identify section headings (for example by font size or weight).

3. If there are any bibliographic references (not in-text citations, but full bibliographic entries), extract those into the "references" array. Note that footnotes are not references. We're looking for a bibliography or works cited section or similar.

4. If there are any images on the page, extract the captions and textual descriptions of those images into the "images" array.

5. If there are any tables on the page, extract the table IDs, titles, and data into the "tables" array.

6. If there are any footnotes on this page (notes appearing at the bottom of the page), extract them into the "footnotes" array:
   - "marker": The footnote marker/number (e.g., "1", "2", "*", "†", "a")
   - "text": The full text of the footnote
   - "page_number": The page number where this footnote appears (use the detected page number from step 8)
   - "in_text_page": The page number where the footnote marker appears in the main text (usually the same as page_number, but could differ)

7. If there are any endnotes on this page (notes collected at the end of a chapter/document), extract them into the "endnotes" array:
   - "marker": The endnote marker/number (e.g., "1", "2", "i", "ii")
   - "text": The full text of the endnote
   - "page_number": The page number where this endnote definition appears

   IMPORTANT: Distinguish between footnotes and endnotes:
   - Footnotes appear at the bottom of the same page as their marker
   - Endnotes are collected in a dedicated section, often at the end of chapters or the document
   - Do NOT confuse bibliographic references with footnotes or endnotes

8. Extract page numbering information into "page_number_info":
   - "page_number": The printed page number visible on this page (e.g., "125", "iv", "A-3"). Look in headers, footers, margins, and corners. If no page number is visible, use an empty string "".
   - "confidence": Your confidence level (0.0-1.0) that the page number is correct. Use 1.0 for clearly printed numbers, 0.5-0.8 for ambiguous cases, and 0.0 if no number is found.
   - "location": Where the page number appears (e.g., "bottom center", "top right", "footer", "none" if not found).
   - "page_range_info": Any page range information from the header or title page (e.g., "Pages 125-150" or "pp. 42-68"). Use empty string "" if none found.

IMPORTANT for page numbers: Be conservative. Only report page numbers with high confidence. Consider that:
- The first page may be unnumbered (title page or cover)
- Chapter first pages are often unnumbered
- Pages with full-bleed images may be unnumbered
- Blank pages may be unnumbered
- Do not confuse section numbers, figure numbers, or other numbers with page numbers"#;

/// Instructions for Markdown / plain-text documents; the content is
/// appended after this prefix.
pub const TEXT_DOCUMENT_PROMPT: &str = r#"Parse this text document from an academic paper and extract it into the specified JSON structure.

1. Extract document metadata (title, authors, publication date, publication, doi, abstract) if present at the beginning.

2. Extract the main textual content:
   - If the document is already in markdown format, preserve the existing markdown syntax (headings, lists, emphasis, etc.).
   - If the document is plain text, convert it to markdown format by identifying section headings and marking them with appropriate heading levels.
   - Preserve paragraph structure.
   - Preserve footnote/endnote references.

3. If there are bibliographic references (full bibliographic entries, not in-text citations), extract those into the "references" array.

4. If there are images (markdown image syntax or image descriptions in text), extract them into the "images" array. For markdown images, use the image URL and alt text. For plain text, this array will typically be empty.

5. If there are tables (markdown tables or structured tabular data), extract their content into the "tables" array. For plain text, this array will typically be empty.

6. If there are footnotes (notes with markers at the bottom of pages), extract them into the "footnotes" array. Use empty strings for page_number and in_text_page fields since text documents don't have reliable page numbers.

7. If there are endnotes at the end of the document, extract them into the "endnotes" array. Use empty string for page_number field.

8. For page_number_info, use empty string for page_number, 0.0 for confidence, "none" for location, and empty string for page_range_info since text documents don't have page numbers.

Text Content:
"#;

/// Summarization prompt prefix; the full document text follows.
pub const SUMMARY_PROMPT: &str = "Summarize this academic text into 1-3 paragraphs. It should be coherent, concise, accurately reflect the original content, and use a detached academic tone. This should be in expository prose, not point form. No lists, just coherent sentences and paragraphs.\n\n";

/// Quotation extraction for one page of a paginated document.
pub fn page_quotations_prompt(page_label: &str, summary: &str, title: &str, content: &str) -> String {
    format!(
        r#"You are analyzing page {page_label} of an academic document.

Document Summary:
{summary}

Document Title: {title}
Page Content:
{content}

Extract 0-3 representative quotations from this page. A good quotation should be:
- A direct quote from the text (exact wording)
- Significant in presenting key arguments, findings, or theoretical contributions
- Self-contained enough to be meaningful on its own
- Memorable or well-articulated
- NOT a citation or reference to other works

For each quotation, provide:
- quotation_text: The exact quoted text (use quotes around it)
- page_number: "{page_label}" (the source page number)
- context: Brief explanation of where this appears (e.g., "in the introduction", "from the methodology section")
- relevance: Why this quotation is significant (key argument, important finding, etc.)

If there are no suitable quotations on this page, return an empty array."#
    )
}

/// Quotation extraction over the full text of a non-paginated document.
pub fn full_text_quotations_prompt(summary: &str, title: &str, content: &str) -> String {
    format!(
        r#"You are analyzing an academic document.

Document Summary:
{summary}

Document Title: {title}
Full Content:
{content}

Extract 5-15 representative quotations from this document. A good quotation should be:
- A direct quote from the text (exact wording)
- Significant in presenting key arguments, findings, or theoretical contributions
- Self-contained enough to be meaningful on its own
- Memorable or well-articulated
- NOT a citation or reference to other works
- Distributed throughout the document (introduction, body, conclusion)

For each quotation, provide:
- quotation_text: The exact quoted text (use quotes around it)
- page_number: "" (empty string since this document doesn't have page numbers)
- context: Brief explanation of where this appears (e.g., "in the introduction", "from the methodology section")
- relevance: Why this quotation is significant (key argument, important finding, etc.)"#
    )
}

/// Second-pass selection when more quotations were found than requested.
pub fn prioritize_quotations_prompt(
    max_quotations: usize,
    title: &str,
    summary: &str,
    quotations_json: &str,
) -> String {
    format!(
        r#"You are reviewing quotations extracted from an academic document and need to select the {max_quotations} most significant ones.

Document Title: {title}
Document Summary:
{summary}

All Extracted Quotations:
{quotations_json}

Your task is to select the {max_quotations} MOST significant quotations from the list above. Prioritize quotations that:
1. Present key arguments or theoretical contributions
2. Contain important findings or conclusions
3. Are memorable or particularly well-articulated
4. Represent different sections of the document (diversity)
5. Are self-contained and meaningful

Return ONLY the selected quotations in the exact same format (with quotation_text, page_number, context, and relevance preserved exactly as provided). Do not modify the quotation text or metadata.

Select exactly {max_quotations} quotations (or fewer if there aren't enough high-quality ones)."#
    )
}
