//! Task prompts: the final user turn of each workflow step.

/// Ask for a full world setting built from a topic.
pub fn world_theme_prompt(topic: &str) -> String {
    format!(
        "Based on the general topic: {topic}

Create a rich and detailed world setting for a book. Include:
1. Time period and setting
2. Major locations and their descriptions
3. Prominent cultural/historical elements
4. Technology level or magical elements (if applicable)
5. Social/political structures
6. Environment and atmosphere

Be specific and detailed, creating a cohesive world that would support an engaging narrative."
    )
}

/// Ask for a short overview of possible world directions to seed a chat.
pub fn world_suggestions_prompt(topic: &str) -> String {
    format!(
        "Based on the general topic: {topic}

Create a brief overview of potential world elements for a book. Include:
1. 2-3 potential time periods or settings that would work well
2. 3-5 key elements that would make this world interesting and unique
3. Brief suggestions for the atmosphere and tone
4. Any potential conflicts or tensions that could exist in this world

Keep it concise but inspiring; this summary guides the creation of a more detailed world setting."
    )
}

/// Close a world-building conversation with the final document.
pub fn finalize_world_prompt(topic: &str) -> String {
    format!(
        "Please create the final, comprehensive world setting document for my book about '{topic}' based on our conversation."
    )
}

/// Ask for `count` characters that fit the world.
pub fn character_creation_prompt(world_theme: &str, count: u32) -> String {
    format!(
        "Based on the world setting:
{world_theme}

Create {count} distinct characters for a book set in this world. For each character include:
1. Name and role in the story
2. Age and physical description
3. Personality traits and quirks
4. Background/history
5. Motivations and goals
6. Conflicts or challenges they face
7. Relationships with other characters (if applicable)

Make each character complex and three-dimensional, with strengths, flaws, and distinguishing characteristics."
    )
}

/// Close a character conversation with the final profiles.
pub fn finalize_characters_prompt(count: u32) -> String {
    format!(
        "Based on our conversation, please create {count} detailed character profiles for the book. \
Format each character with Name, Role, Physical Description, Background, Personality, and Goals/Motivations. \
This will be the final character list for the book."
    )
}

/// Ask for an outline of `chapter_count` chapters.
pub fn outline_generation_prompt(world_theme: &str, characters: &str, chapter_count: u32) -> String {
    format!(
        "Based on the world:
{world_theme}

And the characters:
{characters}

Create a detailed {chapter_count}-chapter outline for a book.

For each chapter include:
1. Chapter title
2. Key events and plot developments
3. Character appearances and development
4. Setting/location
5. Major themes or emotional beats
6. Any important revelations or plot twists

Follow a satisfying story structure with a clear beginning, middle, and end.
The plot should build logically with rising action, climax, and resolution."
    )
}

/// Close an outline conversation with the final, strictly numbered outline.
pub fn finalize_outline_prompt(chapter_count: u32) -> String {
    format!(
        "Based on our conversation, please create a detailed {chapter_count}-chapter outline for the book.

CRITICAL REQUIREMENTS:
1. Create EXACTLY {chapter_count} chapters, numbered sequentially from 1 to {chapter_count}
2. NEVER repeat chapter numbers or restart the numbering
3. Follow the exact format specified in your instructions
4. Each chapter must have a unique title and at least 3 specific key events
5. Maintain a coherent story from beginning to end

Format it as a properly structured outline with clear chapter sections and events. This will be the final outline for the book."
    )
}

/// Material the writer stage works from for one chapter.
#[derive(Debug, Clone, Default, derive_builder::Builder)]
#[builder(setter(into), default)]
pub struct ChapterBrief {
    /// Chapter number
    pub number: u32,
    /// Chapter title
    pub title: String,
    /// Outline prompt, plus any author notes
    pub outline: String,
    /// World setting document
    pub world_theme: String,
    /// Character profiles
    pub characters: String,
    /// Scene notes, if any were prepared
    pub scene_details: String,
    /// Trailing slice of the previous chapter
    pub previous_context: String,
}

impl ChapterBrief {
    /// Creates a new brief builder.
    pub fn builder() -> ChapterBriefBuilder {
        ChapterBriefBuilder::default()
    }
}

/// Ask the writer for a complete chapter.
pub fn chapter_generation_prompt(brief: &ChapterBrief) -> String {
    format!(
        "Generate Chapter {number}: {title}

Based on:
- Chapter outline: {outline}
- World: {world}
- Characters: {characters}
- Scenes: {scenes}
- Previous chapters: {previous}

Write a complete chapter that:
1. Follows the outlined plot points
2. Maintains consistent character voices and development
3. Incorporates world-building details naturally
4. Creates engaging prose with a mix of dialogue, action, and description
5. Has proper pacing with rising and falling tension
6. Connects logically to previous and upcoming chapters

The chapter should be at least 5000 words with a clear beginning, middle, and end structure.",
        number = brief.number,
        title = brief.title,
        outline = brief.outline,
        world = brief.world_theme,
        characters = brief.characters,
        scenes = brief.scene_details,
        previous = brief.previous_context,
    )
}

/// Ask the editor to revise an existing chapter.
pub fn chapter_editing_prompt(content: &str, brief: &ChapterBrief) -> String {
    format!(
        "Review and improve the following chapter:

{content}

Based on:
- Chapter outline: {outline}
- World: {world}
- Characters: {characters}
- Previous chapters: {previous}

Provide a comprehensive edit that:
1. Improves prose quality and flow
2. Ensures character consistency
3. Enhances descriptive elements
4. Strengthens dialogue and character interactions
5. Maintains continuity with established world and plot
6. Fixes any grammatical or structural issues
7. Ensures the chapter is at least 5000 words

Return the complete edited chapter after 'EDITED_SCENE:'.",
        outline = brief.outline,
        world = brief.world_theme,
        characters = brief.characters,
        previous = brief.previous_context,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_outline_repeats_count() {
        let prompt = finalize_outline_prompt(7);
        assert!(prompt.contains("EXACTLY 7 chapters"));
        assert!(prompt.contains("from 1 to 7"));
    }

    #[test]
    fn chapter_prompt_carries_brief() {
        let brief = ChapterBrief::builder()
            .number(3u32)
            .title("The Wreck")
            .outline("- Key Events:\n  * Storm")
            .previous_context("...the lamp went dark.")
            .build()
            .unwrap();
        let prompt = chapter_generation_prompt(&brief);
        assert!(prompt.starts_with("Generate Chapter 3: The Wreck"));
        assert!(prompt.contains("the lamp went dark"));
        assert!(prompt.contains("at least 5000 words"));
    }

    #[test]
    fn editing_prompt_embeds_content() {
        let prompt = chapter_editing_prompt("Once, a keeper.", &ChapterBrief::default());
        assert!(prompt.contains("Once, a keeper."));
        assert!(prompt.contains("EDITED_SCENE:"));
    }
}
