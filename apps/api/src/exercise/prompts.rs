// All LLM prompt constants for the Exercise module.
// Templates use `{placeholder}` markers replaced with `str::replace` before sending.

/// Appended to the lesson context when web search is enabled and the prompt
/// contains URLs. Nothing is actually fetched.
pub const URL_ACKNOWLEDGMENT_NOTE: &str = "Note: The user has provided URLs in their prompt. \
    Acknowledge that you would analyze these URLs to understand the style/content, \
    and provide a response showing you understand the concept of using reference materials.";

/// Token budget for the simulated response.
pub const SIMULATE_MAX_TOKENS: u32 = 800;
/// Token budget for the grading call.
pub const EVALUATE_MAX_TOKENS: u32 = 1000;

/// Meta-prompt wrapping the learner's literal text.
/// Replace: {context}, {user_prompt}
pub const SIMULATE_PROMPT_TEMPLATE: &str = r#"You are simulating how an AI would respond to a user's prompt in a prompt engineering training exercise.

Context: {context}

User's prompt: "{user_prompt}"

Your job:
1. If the prompt is vague, unclear, or missing important details, respond in a way that DEMONSTRATES THE PROBLEMS with the vague prompt. Make assumptions, miss key details, or misinterpret in realistic ways that show what goes wrong.

2. If the prompt is well-structured with clear steps and specific details, respond appropriately and helpfully.

3. If the user provided URLs or reference materials, acknowledge them and show you understand how to use examples.

4. Keep your response concise (2-4 sentences) and realistic.

5. DO NOT explain what's wrong with the prompt - just demonstrate it through your response.

Examples:
- Vague: "Write an email" -> You might write an email but get the tone wrong, miss key details, or make assumptions
- Good: "Write a professional email to my manager. Start with 'Dear [Manager Name]', explain that I'm requesting time off, specify dates June 1-5, and close formally." -> Respond appropriately

Generate a response now:"#;

/// Rubric grading prompt.
/// Replace: {lesson_context}, {criteria}, {ai_response}, {user_prompt}, {json_only}
pub const EVALUATE_PROMPT_TEMPLATE: &str = r#"You are evaluating a user's prompt in a prompt engineering training exercise.

Lesson context: {lesson_context}
Evaluation criteria: The prompt should demonstrate {criteria}

User's prompt: "{user_prompt}"

AI's response to their prompt: "{ai_response}"

Analyze the user's prompt and provide feedback in this EXACT JSON format (DO NOT include any text outside the JSON). Keep the keys exactly as shown:
{
  "passed": true or false,
  "score": number from 1-10,
  "strengths": ["strength 1", "strength 2"],
  "weaknesses": ["weakness 1", "weakness 2"],
  "mainFeedback": "2-3 sentences explaining what went well or what needs improvement",
  "highlights": ["phrase from their prompt that was problematic", "another phrase"],
  "nextSteps": "One specific suggestion for improvement"
}

Rules:
- If the prompt demonstrates the criteria well (clear steps, specific details, good structure), set passed to true and score 7+
- If it's vague, missing steps, or lacks specificity, set passed to false and score below 7
- Be encouraging but honest
- Highlight 1-3 specific phrases from their prompt that were good or problematic
- {json_only}"#;
