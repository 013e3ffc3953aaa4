//! Instructions sent to the model alongside the résumé image.
//!
//! The response format is spelled out as a TypeScript-style interface because
//! models follow a typed schema far more reliably than a prose description.
//! It must stay in sync with [`crate::record::Feedback`]: the model's answer is
//! parsed straight into that struct.

/// Shape of the JSON object the model must return.
pub const RESPONSE_FORMAT: &str = r#"interface Feedback {
  overallScore: number; // max 100
  ATS: {
    score: number; // rate based on ATS suitability
    tips: {
      type: "good" | "improve";
      tip: string; // give 3-4 tips
    }[];
  };
  toneAndStyle: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // make it a short "title" for the actual explanation
      explanation: string; // explain in detail here
    }[]; // give 3-4 tips
  };
  content: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // make it a short "title" for the actual explanation
      explanation: string; // explain in detail here
    }[]; // give 3-4 tips
  };
  structure: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // make it a short "title" for the actual explanation
      explanation: string; // explain in detail here
    }[]; // give 3-4 tips
  };
  skills: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // make it a short "title" for the actual explanation
      explanation: string; // explain in detail here
    }[]; // give 3-4 tips
  };
}"#;

/// Default instruction template. Placeholders: `{job_title}`,
/// `{job_description}`, `{response_format}`.
pub const DEFAULT_INSTRUCTIONS: &str = r#"You are an expert in ATS (Applicant Tracking Systems) and résumé review.
Analyze the attached résumé, rate it, and suggest how to improve it.

Rules:
- Be thorough and detailed. Point out every mistake and area for improvement.
- Scores may be low: a weak résumé deserves a low rating, and an honest score is what helps the candidate.
- If a job description is provided, judge the résumé against that role specifically.

The job title is: {job_title}
The job description is: {job_description}

Provide the feedback using the following format:
{response_format}

Return the analysis as a JSON object only.
Do NOT wrap it in ``` fences.
Do NOT add any other text or comments."#;

/// Build the instructions for one résumé from the default template.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    render_instructions(DEFAULT_INSTRUCTIONS, job_title, job_description)
}

/// Substitute the job fields and response format into `template`.
pub fn render_instructions(template: &str, job_title: &str, job_description: &str) -> String {
    template
        .replace("{job_title}", job_title)
        .replace("{job_description}", job_description)
        .replace("{response_format}", RESPONSE_FORMAT)
}
