//! Prompt construction for brief generation and follow-up questions.

use crate::brief::sections::DEFAULT_SECTIONS;
use crate::upstream::types::{ChatMessage, Lens};

fn lens_guidance(lens: Lens) -> &'static str {
    match lens {
        Lens::Product => {
            "Optimize for customer value, product-market fit, roadmap priority and \
             build-vs-buy tradeoffs. Ask: what is the customer impact and the opportunity cost?"
        }
        Lens::Revenue => {
            "Optimize for revenue growth, pricing, sales efficiency and pipeline health. \
             Ask: what is the impact on ARR, LTV and CAC, and what is the payback period?"
        }
        Lens::Ops => {
            "Optimize for operational efficiency, scalability, resourcing and cost. \
             Ask: how does this scale and what resources does it need?"
        }
        Lens::Customer => {
            "Optimize for satisfaction, retention, adoption and support quality. \
             Ask: what is the churn risk and what are customers actually asking for?"
        }
        Lens::Risk => {
            "Optimize for risk identification, compliance, financial exposure and reliability. \
             Ask: what is the worst case and how is the downside mitigated?"
        }
    }
}

/// System prompt for a decision brief.
///
/// Names every heading verbatim; the parser relies on them.
pub fn brief_system_prompt(lens: Lens) -> String {
    let headings = DEFAULT_SECTIONS
        .iter()
        .map(|s| s.title)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You turn meeting notes, PRDs and strategy memos into decision documents for senior leaders.\n\
         \n\
         ANALYSIS LENS: {lens}\n\
         {guidance}\n\
         \n\
         Output exactly these sections, each introduced by its heading on its own line, \
         in plain text without markdown:\n\
         {headings}\n\
         \n\
         Rules: use only information in the source material; if no explicit decision exists, \
         say so; give a clear recommendation; name owners and timelines when stated; \
         list exactly three next actions as \"Owner - Action - Timeline\".",
        lens = lens,
        guidance = lens_guidance(lens),
        headings = headings,
    )
}

/// Messages for a brief request.
pub fn brief_messages(lens: Lens, content: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(brief_system_prompt(lens)),
        ChatMessage::user(content),
    ]
}

const FOLLOWUP_SYSTEM_PROMPT: &str = "You answer follow-up questions about a decision brief. \
You have the original notes, the generated brief and the conversation so far. \
Answer only from that material in two to four plain-text sentences. \
If the answer is not there, say \"That information wasn't included in the source material\".";

/// Messages for a follow-up question.
pub fn followup_messages(
    notes: &str,
    summary: &str,
    history: &[ChatMessage],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 4);
    messages.push(ChatMessage::system(FOLLOWUP_SYSTEM_PROMPT));
    messages.push(ChatMessage::user(format!("Here are the original notes:\n\n{}", notes)));
    messages.push(ChatMessage::assistant(format!(
        "I've reviewed the notes. Here's the brief that was generated:\n\n{}",
        summary
    )));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(question));
    messages
}
