pub mod system_command_runner;
