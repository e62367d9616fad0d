//! Prompt text for the two remote calls

use super::ScriptRequest;

/// Prompt for the structured analysis call
pub fn analysis_prompt(transcript: &str, language: &str) -> String {
    format!(
        r#"You are a YouTube strategist with one million subscribers.

Analyze the [Input script] and do the following:
1. Summarize in 2-3 sentences the structural reasons this video succeeded (hook, pacing, emotional arc, and so on).
2. Recommend 3 new topics, each from a different field, that would be a hit if this exact structure were applied to them.

Write every field in {language}.

Input script: """{transcript}"""
"#
    )
}

/// Prompt for the streamed script generation call
pub fn generation_prompt(request: &ScriptRequest, language: &str) -> String {
    let ScriptRequest {
        transcript,
        structure_summary,
        topic,
    } = request;

    format!(
        r#"You are a professional YouTube script writer.

Goal:
Benchmark the winning formula of the [Original script] (structure, tone and manner, rhythm) perfectly,
and write a compelling YouTube script about the [New topic].

Input:
1. Original script: """{transcript}"""
2. Structure of the original: "{structure_summary}"
3. New topic: "{topic}"

Writing guide:
- Language: natural spoken {language}, the way YouTube creators talk
- Format: Markdown
- Visual direction: include camera angles and B-roll directions in bold (e.g. **[Scene change: city skyline rushing past]**)
- Structure: follow the original's hook, development, climax and CTA placement exactly.

Output format:

## 🧬 Structure analysis summary
*{structure_summary}*

---

## 🎬 New script: {topic}
*(the script starts here)*
"#
    )
}
