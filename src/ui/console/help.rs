use crate::assistant::CHAT_HELP;
use crate::ui::command::parser;

pub const HELP: &str = r#"
Available assistant commands:

chat <query>                                -- generate a debugger command from plain english and execute it
chat help                                   -- show a description of all assistant commands
explain <>|<question>                       -- explain the previous generated command or answer a question
chat-set-mode ask|agent                     -- confirm generated commands before execution or not
chat-explore <query>                        -- let the assistant investigate the program state on its own
h, help <>|<command>                        -- show help
q, quit                                     -- exit the dbgchat

Any other input is passed to the debugger as is, use `help <topic>` for debugger help.
"#;

pub const HELP_CHAT: &str = "\
\x1b[32;1mchat\x1b[0m
Generate a debugger command from a natural language query and execute it.
In ask mode the command is shown and executed only after confirmation (see `help chat-set-mode`).

Examples of usage:
chat stop my code at line 7 - generate and run `break 7`
chat show me the call stack - generate and run `bt`
chat help - show a description of all assistant commands
";

pub const HELP_EXPLAIN: &str = "\
\x1b[32;1mexplain\x1b[0m
Explain the previous command generated by `chat`, or ask the model any question.

Examples of usage:
explain - explain the previous generated command
explain what is the difference between next and step - answer a question
";

pub const HELP_SET_MODE: &str = "\
\x1b[32;1mchat-set-mode\x1b[0m
Set how generated commands are executed.

Available subcomands:
chat-set-mode ask - show every generated command and ask for confirmation (y/n) before execution
chat-set-mode agent - execute generated commands immediately (default)
";

pub const HELP_EXPLORE: &str = "\
\x1b[32;1mchat-explore\x1b[0m
Start a bounded exploration: the model suggests a command, the command is executed,
its output goes back to the model which suggests the next step.
Exploration ends with a hypothesis, a conclusion, a debugger error or when a step limit is reached.
Exploration commands are executed without confirmation.

Examples of usage:
chat-explore why is `total` negative after the loop
chat-explore segfault in parse_header
";

pub const HELP_QUIT: &str = "\
\x1b[32;1mq, quit\x1b[0m
Exit the dbgchat, debugger process is terminated too.
";

pub fn help_for_command(command: Option<&str>) -> &str {
    match command {
        None => HELP,
        Some(parser::CHAT_COMMAND) => HELP_CHAT,
        Some(parser::EXPLAIN_COMMAND) => HELP_EXPLAIN,
        Some(parser::SET_MODE_COMMAND) => HELP_SET_MODE,
        Some(parser::EXPLORE_COMMAND) => HELP_EXPLORE,
        Some(parser::HELP_COMMAND) | Some(parser::HELP_COMMAND_SHORT) => CHAT_HELP,
        Some(parser::QUIT_COMMAND) | Some(parser::QUIT_COMMAND_SHORT) => HELP_QUIT,
        _ => "unknown command",
    }
}
