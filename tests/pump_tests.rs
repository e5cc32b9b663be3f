use futures_lite::io::Cursor;
use mc_server_runner::console::{BufferConsole, Style};
use mc_server_runner::pump::{
    InputEnd, OperatorInput, OutputStream, join_pump, spawn_input_pump, spawn_output_pump,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_stdout_lines_relayed_unchanged() {
    let console = BufferConsole::new();
    let output = Cursor::new(b"[Server thread/INFO]: Starting\r\nDone (4.1s)!\nno newline".to_vec());

    let pump = spawn_output_pump(output, Arc::new(console.clone()), OutputStream::Stdout);
    assert_eq!(pump.await.unwrap(), 3);

    assert_eq!(
        console.lines(),
        vec![
            (Style::Output, "[Server thread/INFO]: Starting".to_string()),
            (Style::Output, "Done (4.1s)!".to_string()),
            (Style::Output, "no newline".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_stderr_lines_prefixed() {
    let console = BufferConsole::new();
    let output = Cursor::new(b"Exception in thread \"main\"\n\tat Main\n".to_vec());

    let pump = spawn_output_pump(output, Arc::new(console.clone()), OutputStream::Stderr);
    pump.await.unwrap();

    assert_eq!(
        console.lines_with(Style::Error),
        vec!["[ERROR] Exception in thread \"main\"", "[ERROR] \tat Main"]
    );
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let console = BufferConsole::new();
    let output = Cursor::new(vec![b'o', b'k', 0xff, b'\n']);

    spawn_output_pump(output, Arc::new(console.clone()), OutputStream::Stdout)
        .await
        .unwrap();
    assert_eq!(console.lines_with(Style::Output), vec!["ok\u{fffd}"]);
}

#[tokio::test]
async fn test_empty_stream_ends_immediately() {
    let console = BufferConsole::new();
    let pump = spawn_output_pump(
        Cursor::new(Vec::new()),
        Arc::new(console.clone()),
        OutputStream::Stdout,
    );
    assert_eq!(join_pump("stdout", pump, Duration::from_secs(1)).await, Some(0));
    assert!(console.lines().is_empty());
}

#[tokio::test]
async fn test_join_pump_aborts_stuck_task() {
    let stuck = tokio::spawn(std::future::pending::<()>());
    assert_eq!(join_pump("stuck", stuck, Duration::from_millis(20)).await, None);
}

#[cfg(unix)]
#[tokio::test]
async fn test_input_forwarded_to_child() {
    use async_process::{Command, Stdio};
    use futures_lite::io::AsyncReadExt;

    let mut child = Command::new("sh")
        .args(["-c", "while read line; do echo \"got:$line\"; done"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    let stdin = child.stdin.take().unwrap();
    let mut stdout = child.stdout.take().unwrap();

    let (tx, input) = OperatorInput::channel();
    let flag = Arc::new(AtomicBool::new(true));
    let (_shutdown_tx, shutdown_rx) = oneshot::channel();

    tx.send("say hello".to_string()).await.unwrap();
    tx.send(" reboot ".to_string()).await.unwrap();
    let pump = spawn_input_pump(stdin, input, flag.clone(), shutdown_rx);

    assert_eq!(pump.await.unwrap().unwrap(), InputEnd::Restart);
    assert!(flag.load(Ordering::SeqCst));

    // The pump dropped stdin, so the loop ends and stdout closes.
    let mut received = String::new();
    stdout.read_to_string(&mut received).await.unwrap();
    assert_eq!(received, "got:say hello\ngot:stop\n");
    child.status().await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_broken_pipe_ends_only_input_pump() {
    use async_process::{Command, Stdio};

    let mut child = Command::new("sh")
        .args(["-c", "exit 0"])
        .stdin(Stdio::piped())
        .spawn()
        .unwrap();
    let stdin = child.stdin.take().unwrap();
    child.status().await.unwrap();

    let (tx, input) = OperatorInput::channel();
    let (_shutdown_tx, shutdown_rx) = oneshot::channel();
    let pump = spawn_input_pump(stdin, input, Arc::new(AtomicBool::new(true)), shutdown_rx);

    // The reader is gone, so the first write fails.
    tx.send("list".to_string()).await.unwrap();
    let result = pump.await.unwrap();
    assert!(result.is_err());
}
