//! Built-in two-week prompt-engineering course.

use crate::model::{LessonDefinition, LessonId, Week};

struct Entry {
    week: Week,
    title: &'static str,
    theory: &'static str,
    example: &'static str,
    task: &'static str,
    grading_criteria: &'static str,
}

const COURSE: [Entry; 14] = [
    Entry {
        week: Week::One,
        title: "Anatomy of a Prompt (role, task, context, format)",
        theory: "A strong prompt names **who** the model should be, **what** it must do, the **context** it needs and the **format** of the answer. Leaving any of them out forces the model to guess.",
        example: "Weak: `Write about coffee.`\n\nStrong: `You are a barista trainer. Write a 5-step checklist for new staff on dialing in espresso. Audience: first-week employees. Format: numbered list, max 15 words per step.`",
        task: "Rewrite the prompt `Tell me about marketing` so that it contains a role, a concrete task, context about the audience and an explicit output format.",
        grading_criteria: "The submission must contain all four parts: a role, a specific task, audience or situational context, and an output format. Vague restatements of the original fail.",
    },
    Entry {
        week: Week::One,
        title: "Being Specific (constraints and details)",
        theory: "Models fill gaps with averages. Numbers, lengths, tone words and exclusions turn an average answer into the one you need.",
        example: "`Summarize this article in 3 bullet points, each under 20 words, for a CFO. Do not mention the company's history.`",
        task: "Write a prompt asking for a product description of a reusable water bottle with at least three measurable constraints.",
        grading_criteria: "At least three explicit, checkable constraints (length, count, tone, audience, exclusions). Generic requests without measurable limits fail.",
    },
    Entry {
        week: Week::One,
        title: "Personas (role prompting)",
        theory: "Assigning an expert persona shifts vocabulary, depth and priorities. Pair the persona with the audience it is speaking to.",
        example: "`You are a senior security auditor explaining SQL injection to a junior developer who knows basic SQL.`",
        task: "Create a prompt where the model acts as a nutritionist explaining intermittent fasting to a teenager athlete.",
        grading_criteria: "A clearly defined expert persona, an explicitly described audience, and an instruction adapting depth or tone to that audience.",
    },
    Entry {
        week: Week::One,
        title: "Few-Shot Examples (teaching by showing)",
        theory: "Showing two or three input/output pairs teaches the pattern faster than describing it. Keep examples consistent in structure.",
        example: "`Classify sentiment.\nReview: 'Loved it' -> positive\nReview: 'Broke in a day' -> negative\nReview: 'Arrived on time' ->`",
        task: "Write a few-shot prompt that converts informal sentences into formal business English, with at least two examples.",
        grading_criteria: "At least two consistent input/output example pairs followed by the new input to transform.",
    },
    Entry {
        week: Week::One,
        title: "Output Formats (tables, JSON, lists)",
        theory: "Ask for the exact structure you will consume: a table with named columns, JSON with named keys, or a fixed list shape.",
        example: "`Return JSON: {\"title\": string, \"tags\": string[], \"difficulty\": 1-5}`",
        task: "Write a prompt that extracts the name, date and amount from an invoice text and returns them as JSON with a schema you define.",
        grading_criteria: "Defines every output key with its type, asks for JSON only, and says what to do when a field is missing.",
    },
    Entry {
        week: Week::One,
        title: "Chain of Thought (step-by-step reasoning)",
        theory: "Asking the model to reason step by step before answering improves accuracy on multi-step problems. Separate the reasoning from the final answer.",
        example: "`Solve the problem. First list the known facts, then reason step by step, then give the final answer on a line starting with ANSWER:`",
        task: "Write a prompt for estimating how many piano tuners work in a city, making the model show its reasoning steps before the estimate.",
        grading_criteria: "Explicitly requests step-by-step reasoning and a clearly separated final answer.",
    },
    Entry {
        week: Week::One,
        title: "Iteration (refining a draft)",
        theory: "Good results come from loops: draft, critique against criteria, revise. You can ask the model to perform the critique itself.",
        example: "`Write a tagline. Then critique it against: memorable, under 6 words, no cliches. Then write an improved version.`",
        task: "Write a prompt that makes the model draft a cold email, critique it against three criteria of your choice and produce a revised version.",
        grading_criteria: "Contains a draft step, at least three named critique criteria and an explicit revision step.",
    },
    Entry {
        week: Week::Two,
        title: "Prompt Chaining (splitting complex work)",
        theory: "Break large tasks into stages whose outputs feed the next prompt: research, outline, draft, polish.",
        example: "`Step 1 prompt: list 5 angles. Step 2 prompt: given angle X, write an outline.`",
        task: "Design a chain of at least three prompts that turns a raw interview transcript into a published blog post.",
        grading_criteria: "Three or more distinct prompts where each consumes the previous output, with a clear purpose per stage.",
    },
    Entry {
        week: Week::Two,
        title: "System Prompts (persistent behaviour)",
        theory: "A system prompt sets rules that hold across the conversation: scope, tone, refusals and format defaults.",
        example: "`System: You are a support bot for AcmeCloud. Only answer questions about billing. Reply in under 80 words.`",
        task: "Write a system prompt for a customer-support assistant of an online bookstore, including scope limits and tone rules.",
        grading_criteria: "Defines scope, what to do for out-of-scope questions, tone, and at least one formatting rule.",
    },
    Entry {
        week: Week::Two,
        title: "Guardrails (handling ambiguity and refusal)",
        theory: "Tell the model what to do when input is missing, ambiguous or unsafe: ask a clarifying question, refuse, or use a stated default.",
        example: "`If the user's request lacks a budget, ask for it before recommending anything.`",
        task: "Write a prompt for a travel planner that specifies behaviour when dates, budget or destination are missing.",
        grading_criteria: "Explicit fallback behaviour for each of dates, budget and destination.",
    },
    Entry {
        week: Week::Two,
        title: "Evaluation Rubrics (model as judge)",
        theory: "A model can grade work consistently if you give it a rubric with weighted criteria and a required output format for the verdict.",
        example: "`Score the essay 1-10 on clarity (40%), evidence (40%), grammar (20%). Return JSON with per-criterion scores and a total.`",
        task: "Write a prompt that makes the model grade a job-application cover letter with a weighted rubric.",
        grading_criteria: "Named criteria with weights, a numeric scale, and a structured verdict format.",
    },
    Entry {
        week: Week::Two,
        title: "Data Analysis Prompts (working with tables)",
        theory: "When analysing data, describe the columns, the question, and the form of the insight you want; ask the model to state its assumptions.",
        example: "`Columns: date, region, revenue. Find the region with the fastest month-over-month growth and explain the calculation.`",
        task: "Write a prompt that analyses a CSV of monthly subscription churn and produces three actionable insights.",
        grading_criteria: "Describes the data columns, asks a precise analytical question, requests stated assumptions and exactly three insights.",
    },
    Entry {
        week: Week::Two,
        title: "Image Generation Prompts (visual language)",
        theory: "Image models respond to subject, style, composition, lighting and medium. Order matters: subject first, modifiers after.",
        example: "`A lighthouse on a basalt cliff at dusk, oil painting, wide shot, warm rim light, stormy sea`",
        task: "Write an image prompt for a book cover of a cozy mystery novel set in a bakery.",
        grading_criteria: "Names the subject, an art style or medium, composition and lighting; avoids vague adjectives only.",
    },
    Entry {
        week: Week::Two,
        title: "Capstone (building a reusable template)",
        theory: "A reusable template has placeholders, instructions for each placeholder and a fixed output format so anyone can reuse it.",
        example: "`You are [ROLE]. Create [DELIVERABLE] for [AUDIENCE]. Constraints: [CONSTRAINTS]. Output: [FORMAT].`",
        task: "Build a reusable prompt template for weekly team status reports with at least four placeholders.",
        grading_criteria: "Four or more bracketed placeholders, guidance for filling them, and a defined output structure.",
    },
];

pub(crate) fn lessons() -> Vec<LessonDefinition> {
    (1_u32..)
        .zip(COURSE.iter())
        .map(|(id, entry)| {
            LessonDefinition::new(
                LessonId::new(id),
                entry.week,
                entry.title,
                entry.theory,
                entry.example,
                entry.task,
                entry.grading_criteria,
            )
        })
        .collect()
}
