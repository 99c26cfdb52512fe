use std::time::Duration;

use llm_chat::core::conversation::Role;
use llm_chat::core::{ConversationClient, ModelClient};
use llm_chat::{ProviderKind, Repl};
use llm_chat_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use tokio::io::{AsyncWriteExt, BufReader, duplex};
use tokio::time::sleep;

fn client_with(provider: TestModelProvider) -> ConversationClient {
    ConversationClient::new(ModelClient::new(provider), "gpt-3.5-turbo")
        .with_system_prompt("You are a helpful AI assistant.")
}

async fn run(
    provider: TestModelProvider,
    kind: ProviderKind,
    input: &str,
) -> (ConversationClient, String) {
    let client = client_with(provider);
    let mut repl = Repl::new(client, kind, input.as_bytes(), Vec::new());
    repl.run().await.unwrap();
    let output = String::from_utf8(repl.output().clone()).unwrap();
    (repl.client().clone(), output)
}

#[tokio::test]
async fn test_hello_then_exit() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetResponse::with_text(
        "Hello! How can I help you today?",
    ));

    let (client, output) =
        run(provider, ProviderKind::OpenAI, "hello\nexit\n").await;

    let history = client.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].role(), Role::User);
    assert_eq!(history[1].content(), "hello");
    assert_eq!(history[2].role(), Role::Assistant);
    assert_eq!(history[2].content(), "Hello! How can I help you today?");

    assert!(output.contains("=== Welcome to OpenAI Chat! ==="));
    assert!(output.contains("AI: Hello! How can I help you today?\n"));
    assert!(output.trim_end().ends_with("Goodbye!"));
}

#[tokio::test]
async fn test_end_of_input_exits() {
    let (client, output) = run(
        TestModelProvider::default(),
        ProviderKind::OpenAI,
        "\n   \n",
    )
    .await;
    assert_eq!(client.history().len(), 1);
    assert!(output.trim_end().ends_with("Goodbye!"));
}

#[tokio::test]
async fn test_streamed_reply_is_printed_once() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetResponse::with_events([
        PresetEvent::MessageDelta("Why did ".to_owned()),
        PresetEvent::MessageDelta("the chicken ".to_owned()),
        PresetEvent::MessageDelta("cross the road?".to_owned()),
    ]));

    let (_, output) =
        run(provider, ProviderKind::Ollama, "Tell me a joke\nquit\n").await;
    assert!(output.contains("AI: Why did the chicken cross the road?\n"));
    assert_eq!(output.matches("AI:").count(), 1);
}

#[tokio::test]
async fn test_commands() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetResponse::with_text("Hi!"));
    provider.add_reply(PresetResponse::with_text("Still here."));
    let journal = provider.clone();

    let input = "\
Hello
HISTORY
clear
history
Hello
model deepseek-chat
model
help
exit
";
    let (client, output) = run(provider, ProviderKind::OpenRouter, input).await;

    assert!(output.contains("You: Hello\nAI: Hi!\n"));
    assert!(output.contains("Conversation history cleared."));
    assert!(output.contains("No messages yet."));
    assert!(output.contains("Switched to model: deepseek/deepseek-chat"));
    assert!(output.contains("Current model: deepseek/deepseek-chat"));
    assert!(output.contains("Type 'model <name>' to switch models"));

    // Switching models resets the transcript.
    assert_eq!(client.model(), "deepseek/deepseek-chat");
    assert_eq!(client.history().len(), 1);
    // After `clear` the second "Hello" was a first turn again.
    assert_eq!(journal.requests()[1].messages.len(), 2);
}

#[tokio::test]
async fn test_failure_is_reported_and_loop_continues() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(
        PresetResponse::with_text("Back online.").with_failures(1),
    );

    let (client, output) =
        run(provider, ProviderKind::OpenAI, "Hello\nHello\nexit\n").await;

    assert!(output.contains("Error: scripted failure"));
    assert!(output.contains("Please try again."));
    assert!(output.contains("AI: Back online."));
    assert_eq!(client.history().len(), 3);
}

#[tokio::test]
async fn test_list_models() {
    let mut provider = TestModelProvider::default();
    provider.set_models(["llama2:latest", "llama3.2:latest"]);
    let (_, output) =
        run(provider, ProviderKind::Ollama, "models\nexit\n").await;
    assert!(
        output.contains("Available models: llama2:latest, llama3.2:latest")
    );

    let (_, output) = run(
        TestModelProvider::default(),
        ProviderKind::OpenRouter,
        "models\nexit\n",
    )
    .await;
    assert!(output.contains("1. deepseek-chat (deepseek/deepseek-chat)"));
    assert!(output.contains("2. deepseek-r1 (deepseek/deepseek-r1)"));
}

#[tokio::test]
async fn test_invalid_utf8_line_is_skipped() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetResponse::with_text("Hi!"));
    let client = client_with(provider);
    let input: &[u8] = b"caf\xE9\nhello\nexit\n";
    let mut repl = Repl::new(client, ProviderKind::OpenAI, input, Vec::new());

    repl.run().await.unwrap();
    let history = repl.client().history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].content(), "hello");
    assert_eq!(history[2].content(), "Hi!");
}

#[tokio::test]
async fn test_interrupt_while_waiting_for_input() {
    // The writer half stays open, so the loop blocks on reading.
    let (mut writer, reader) = duplex(64);
    writer.write_all(b"history\n").await.unwrap();

    let client = client_with(TestModelProvider::default());
    let mut repl = Repl::new(
        client,
        ProviderKind::OpenAI,
        BufReader::new(reader),
        Vec::new(),
    )
    .with_interrupt(sleep(Duration::from_millis(50)));

    repl.run().await.unwrap();
    let output = String::from_utf8(repl.output().clone()).unwrap();
    assert!(output.contains("No messages yet."));
    assert!(output.trim_end().ends_with("Exiting gracefully..."));
    assert!(!output.contains("Goodbye!"));
}

#[tokio::test]
async fn test_interrupt_while_waiting_for_reply() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetResponse::with_text("Too late."));
    provider.set_delay(Duration::from_secs(60));

    let client = client_with(provider);
    let input: &[u8] = b"hello\nexit\n";
    let mut repl = Repl::new(client, ProviderKind::OpenAI, input, Vec::new())
        .with_interrupt(sleep(Duration::from_millis(50)));

    repl.run().await.unwrap();
    let output = String::from_utf8(repl.output().clone()).unwrap();
    assert!(output.trim_end().ends_with("Exiting gracefully..."));
    assert!(!output.contains("Too late."));
    assert!(!output.contains("Goodbye!"));
}
