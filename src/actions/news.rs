//! Google News headlines, optionally summarized by Gemini.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{Html, Node, Selector};
use tracing::{debug, info, warn};

use super::dispatcher::NewsSource;
use crate::error::ActionError;
use crate::llm::GeminiClient;

const NEWS_FEED_URL: &str = "https://news.google.com/rss?hl=ko&gl=KR&ceid=KR:ko";
const NEWS_COUNT: usize = 5;
const ARTICLE_CHAR_LIMIT: usize = 4000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").unwrap());
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<title\b[^>]*>(.*?)</title>").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<link\b[^>]*>(.*?)</link>").unwrap());
static CDATA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^<!\[CDATA\[(.*)\]\]>$").unwrap());

static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Elements whose text is never read aloud.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[기사\s*\d+\]|\*\*기사\s*\d+\*\*|\d+\.\s*기사").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*+").unwrap());
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#+\s*").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*[-•]\s+").unwrap());
static NUMBERING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").unwrap());
static LEFTOVER_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[기사\s*\d+\]").unwrap());

/// Headline and article link from the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
}

/// Parse the first `limit` items of an RSS document.
pub fn parse_feed(xml: &str, limit: usize) -> Vec<NewsItem> {
    ITEM_RE
        .captures_iter(xml)
        .filter_map(|item| {
            let body = item.get(1)?.as_str();
            let title = element_text(&TITLE_RE, body)?;
            let link = element_text(&LINK_RE, body)?;
            Some(NewsItem { title, link })
        })
        .take(limit)
        .collect()
}

fn element_text(re: &Regex, body: &str) -> Option<String> {
    let raw = re.captures(body)?.get(1)?.as_str().trim();
    let raw = CDATA_RE.captures(raw).and_then(|c| c.get(1)).map_or(raw, |m| m.as_str());
    let text = decode_entities(raw.trim());
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Decode HTML entities (`&amp;`, `&#8230;`, `&nbsp;`, ...) in a feed value.
fn decode_entities(text: &str) -> String {
    Html::parse_fragment(text).root_element().text().collect()
}

/// Visible text of an HTML page, whitespace collapsed and cut to the article limit.
pub fn strip_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document.select(&BODY_SELECTOR).next().unwrap_or_else(|| document.root_element());

    let text = root
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .ancestors()
                    .any(|a| matches!(a.value(), Node::Element(e) if HIDDEN_ELEMENTS.contains(&e.name())));
                (!hidden).then_some(&**text)
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ");

    text.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(ARTICLE_CHAR_LIMIT).collect()
}

/// Remove markdown and leftover separators so the text reads cleanly aloud.
pub fn clean_tts_text(text: &str) -> String {
    let text = BOLD_RE.replace_all(text, "");
    let text = HEADING_RE.replace_all(&text, "");
    let text = BULLET_RE.replace_all(&text, "");
    let text = NUMBERING_RE.replace_all(&text, "");
    let text = LEFTOVER_SEPARATOR_RE.replace_all(&text, "");
    SPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Split a bulk summary into one entry per article.
///
/// Returns the whole cleaned summary as a single entry when the separators
/// don't line up with `expected`.
pub fn split_summaries(raw: &str, expected: usize) -> Vec<String> {
    let parts: Vec<String> =
        SEPARATOR_RE.split(raw).filter(|p| !p.trim().is_empty()).map(clean_tts_text).collect();

    if parts.len() == expected {
        parts
    } else {
        debug!("Summary split into {} parts, expected {}", parts.len(), expected);
        vec![clean_tts_text(raw)]
    }
}

/// Join summaries into a single briefing with spoken item prefixes.
pub fn compose_briefing(summaries: &[String], item_count: usize) -> String {
    if summaries.len() == 1 && item_count > 1 {
        return summaries[0].clone();
    }

    summaries
        .iter()
        .enumerate()
        .map(|(i, summary)| {
            let prefix = if i == 0 { "첫 뉴스입니다." } else { "다음 뉴스입니다." };
            format!("{} {}", prefix, summary)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn summary_prompt(articles: &[(NewsItem, String)]) -> String {
    let mut prompt = format!(
        "다음 {}개 뉴스 기사를 각각 방송용 멘트처럼 요약해줘.\n\
         아래 규칙을 반드시 지켜야 해:\n\
         1. 각 기사를 4~6개의 짧은 문장으로 요약해.\n\
         2. 모든 문장에 주어를 명시해야 해. (예: '정부가 발표했습니다.')\n\
         3. '그', '그녀', '그들' 같은 지시대명사는 절대 사용하지 마.\n\
         4. 문장은 6하원칙(누가, 언제, 어디서, 무엇을, 어떻게, 왜)에 맞게 완결되어야 해.\n\
         5. 신문사 이름은 절대 언급하지 마.\n\
         6. 인사, 서론, 부연 설명 없이 요약 본문만 즉시 시작해야 해.\n\
         7. 마크다운, 번호 매기기 등 서식을 사용하지 마.\n\
         8. 각 기사 요약은 `[기사 1]`, `[기사 2]` 형식으로 구분해줘.\n\n",
        articles.len()
    );

    for (i, (item, text)) in articles.iter().enumerate() {
        let body = if text.is_empty() { &item.title } else { text };
        prompt.push_str(&format!("[기사 {}]\n제목: {}\n본문: {}\n\n", i + 1, item.title, body));
    }
    prompt
}

/// Google News RSS reader.
pub struct GoogleNews {
    client: reqwest::Client,
    feed_url: String,
    llm: Option<GeminiClient>,
}

impl GoogleNews {
    /// Create a news source. Without `llm` only headlines are read.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(llm: Option<GeminiClient>) -> Result<Self> {
        if llm.is_none() {
            info!("No Gemini API key, news will be read as headlines");
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("Mozilla/5.0")
            .build()
            .context("Failed to create news client")?;

        Ok(Self { client, feed_url: NEWS_FEED_URL.to_string(), llm })
    }

    async fn fetch_headlines(&self) -> Result<Vec<NewsItem>, ActionError> {
        let xml = self.client.get(&self.feed_url).send().await?.error_for_status()?.text().await?;
        let items = parse_feed(&xml, NEWS_COUNT);
        if items.is_empty() {
            return Err(ActionError::NoNews);
        }
        Ok(items)
    }

    /// Article body text, or empty when the page can't be fetched.
    async fn fetch_article_text(&self, url: &str) -> String {
        let page = async { self.client.get(url).send().await?.error_for_status()?.text().await };
        match page.await {
            Ok(html) => strip_html(&html),
            Err(e) => {
                warn!("Failed to fetch article {}: {}", url, e);
                String::new()
            }
        }
    }

    async fn summarize(&self, llm: &GeminiClient, items: Vec<NewsItem>) -> Vec<String> {
        let mut articles = Vec::with_capacity(items.len());
        for item in items {
            let text = self.fetch_article_text(&item.link).await;
            debug!("Article \"{}\": {} chars", item.title, text.chars().count());
            articles.push((item, text));
        }

        info!("🧠 Summarizing {} articles...", articles.len());
        match llm.generate(&summary_prompt(&articles)).await {
            Ok(raw) => split_summaries(&raw, articles.len()),
            Err(e) => {
                warn!("Summary failed, reading headlines: {}", e);
                articles.into_iter().map(|(item, _)| item.title).collect()
            }
        }
    }
}

impl NewsSource for GoogleNews {
    async fn headlines(&self) -> Result<Vec<NewsItem>, ActionError> {
        self.fetch_headlines().await
    }

    async fn briefing(&self, items: Vec<NewsItem>) -> String {
        let item_count = items.len();

        let summaries = match &self.llm {
            Some(llm) => self.summarize(llm, items).await,
            None => items.into_iter().map(|item| item.title).collect(),
        };

        compose_briefing(&summaries, item_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>Google 뉴스</title>
<item><title>첫 번째 헤드라인 - 언론사</title><link>https://news.google.com/a1</link></item>
<item><title><![CDATA[두 번째 &amp; 헤드라인]]></title><link>https://news.google.com/a2</link></item>
<item><title></title><link>https://news.google.com/empty</link></item>
<item><title>세 번째</title><link>https://news.google.com/a3</link></item>
</channel></rss>"#;

    #[test]
    fn test_parse_feed() {
        let items = parse_feed(FEED, 5);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], NewsItem { title: "첫 번째 헤드라인 - 언론사".into(), link: "https://news.google.com/a1".into() });
        assert_eq!(items[1].title, "두 번째 & 헤드라인");
        assert_eq!(items[2].link, "https://news.google.com/a3");
    }

    #[test]
    fn test_parse_feed_limit_and_empty() {
        assert_eq!(parse_feed(FEED, 1).len(), 1);
        assert!(parse_feed("<rss><channel></channel></rss>", 5).is_empty());
    }

    #[test]
    fn test_strip_html() {
        let html = "<html><head><style>p { color: red; }</style><script type=\"x\">var a = 1;</script></head>\
                    <body><noscript>켜세요</noscript><p>정부가   발표했습니다.</p>\n<div>내용</div></body></html>";
        assert_eq!(strip_html(html), "정부가 발표했습니다. 내용");
    }

    #[test]
    fn test_entities_are_decoded() {
        let feed = "<item><title>속보&#8230; 정부&nbsp;발표 &quot;확정&quot; &#x2014; 언론사</title><link>https://a?x=1&amp;y=2</link></item>";
        let items = parse_feed(feed, 5);
        assert_eq!(items[0].title, "속보\u{2026} 정부\u{a0}발표 \"확정\" \u{2014} 언론사");
        assert_eq!(items[0].link, "https://a?x=1&y=2");

        let html = "<body><p>기온이&nbsp;올랐습니다&#8230;</p><p>A &lt; B &amp;&#32;C</p></body>";
        assert_eq!(strip_html(html), "기온이 올랐습니다\u{2026} A < B & C");
    }

    #[test]
    fn test_strip_html_without_body() {
        assert_eq!(strip_html("그냥 <b>텍스트</b>"), "그냥 텍스트");
        assert!(strip_html("<script>only()</script>").is_empty());
    }

    #[test]
    fn test_strip_html_limit() {
        let html = format!("<p>{}</p>", "가".repeat(5000));
        assert_eq!(strip_html(&html).chars().count(), ARTICLE_CHAR_LIMIT);
    }

    #[test]
    fn test_clean_tts_text() {
        assert_eq!(clean_tts_text("## 제목\n- **정부가** 발표했습니다.\n1. 둘째 [기사 3]"), "제목 정부가 발표했습니다. 둘째");
    }

    #[test]
    fn test_split_summaries() {
        let raw = "[기사 1]\n정부가 발표했습니다.\n\n[기사 2]\n**시장이** 올랐습니다.";
        assert_eq!(split_summaries(raw, 2), vec!["정부가 발표했습니다.", "시장이 올랐습니다."]);
    }

    #[test]
    fn test_split_mismatch_returns_whole() {
        let raw = "[기사 1] 하나. [기사 2] 둘.";
        assert_eq!(split_summaries(raw, 3), vec!["하나. 둘."]);
    }

    #[test]
    fn test_compose_briefing() {
        let summaries = vec!["하나.".to_string(), "둘.".to_string()];
        assert_eq!(compose_briefing(&summaries, 2), "첫 뉴스입니다. 하나. 다음 뉴스입니다. 둘.");
        assert_eq!(compose_briefing(&["전체 요약.".to_string()], 5), "전체 요약.");
        assert_eq!(compose_briefing(&["하나.".to_string()], 1), "첫 뉴스입니다. 하나.");
    }

    #[test]
    fn test_summary_prompt_uses_title_without_body() {
        let articles = vec![
            (NewsItem { title: "제목1".into(), link: "l1".into() }, "본문 내용".into()),
            (NewsItem { title: "제목2".into(), link: "l2".into() }, String::new()),
        ];
        let prompt = summary_prompt(&articles);
        assert!(prompt.starts_with("다음 2개 뉴스 기사를"));
        assert!(prompt.contains("[기사 1]\n제목: 제목1\n본문: 본문 내용"));
        assert!(prompt.contains("[기사 2]\n제목: 제목2\n본문: 제목2"));
    }
}
