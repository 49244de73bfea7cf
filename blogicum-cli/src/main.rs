use anyhow::{Context, Result};
use blogicum_client::models::{
    CreatePostRequest, LoginRequest, Post, RegisterRequest, UpdatePostRequest,
    UpdateProfileRequest,
};
use blogicum_client::{BlogicumClientError, HttpClient};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server base URL; falls back to BLOGICUM_SERVER, then localhost
    #[arg(short, long, env = "BLOGICUM_SERVER")]
    server: Option<String>,

    #[arg(long)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },

    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    Logout,

    Status,

    /// Show the account behind the saved token
    Me,

    /// Public feed
    Index {
        #[arg(short, long)]
        page: Option<i64>,
    },

    Category {
        slug: String,

        #[arg(short, long)]
        page: Option<i64>,
    },

    Profile {
        username: String,

        #[arg(short, long)]
        page: Option<i64>,
    },

    EditProfile {
        username: String,

        #[arg(long)]
        new_username: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    #[command(subcommand)]
    Post(PostCommand),

    #[command(subcommand)]
    Comment(CommentCommand),
}

#[derive(Subcommand)]
enum PostCommand {
    Get {
        id: i64,

        /// Page of comments
        #[arg(short, long)]
        page: Option<i64>,
    },

    Create {
        #[arg(short, long)]
        title: String,

        #[arg(long)]
        text: String,

        /// RFC 3339 timestamp; a future date schedules the post
        #[arg(long)]
        pub_date: Option<DateTime<Utc>>,

        #[arg(long)]
        draft: bool,

        #[arg(long)]
        category: Option<i64>,

        #[arg(long)]
        location: Option<i64>,
    },

    Update {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        pub_date: Option<DateTime<Utc>>,

        #[arg(long)]
        published: Option<bool>,

        #[arg(long)]
        category: Option<i64>,

        #[arg(long)]
        location: Option<i64>,
    },

    Delete {
        id: i64,
    },

    Image {
        id: i64,

        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CommentCommand {
    Add {
        post_id: i64,

        text: String,
    },

    Edit {
        post_id: i64,

        comment_id: i64,

        text: String,
    },

    Delete {
        post_id: i64,

        comment_id: i64,
    },
}

struct TokenManager {
    token_path: PathBuf,
}

impl TokenManager {
    fn new(custom_path: Option<PathBuf>) -> Result<Self> {
        let token_path = match custom_path {
            Some(path) => path,
            None => {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                home.join(".blogicum_token")
            }
        };

        Ok(Self { token_path })
    }

    fn save_token(&self, token: &str) -> Result<()> {
        fs::write(&self.token_path, token)
            .with_context(|| format!("Failed to save token to {:?}", self.token_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.token_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.token_path, perms)?;
        }

        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.token_path) {
            Ok(token) => {
                let token = token.trim().to_string();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read token file"),
        }
    }

    fn clear_token(&self) -> Result<()> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)
                .with_context(|| format!("Failed to remove token file {:?}", self.token_path))?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let server = cli.server.unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let mut client = HttpClient::new(server)?;

    let token_manager = TokenManager::new(cli.token_file)?;
    if let Some(token) = token_manager.load_token()? {
        client.set_token(token);
    }

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
            first_name,
            last_name,
        } => {
            let req = RegisterRequest {
                username,
                email,
                password,
                first_name,
                last_name,
            };
            match client.register(req).await {
                Ok(response) => {
                    println!("{} {}", "Registered".green(), response.user.username);
                    token_manager.save_token(&response.token)?;
                }
                Err(e) => fail("Registration failed", e),
            }
        }

        Commands::Login { username, password } => {
            match client.login(LoginRequest { username, password }).await {
                Ok(response) => {
                    println!("{} {}", "Logged in as".green(), response.user.username);
                    token_manager.save_token(&response.token)?;
                }
                Err(e) => fail("Login failed", e),
            }
        }

        Commands::Logout => {
            token_manager.clear_token()?;
            println!("{}", "Token removed".green());
        }

        Commands::Status => match token_manager.load_token()? {
            Some(token) => {
                println!("Token file: {:?}", token_manager.token_path);
                println!("Token: {}...", token.chars().take(20).collect::<String>());
            }
            None => println!("{}", "Not logged in".yellow()),
        },

        Commands::Me => match client.me().await {
            Ok(user) => {
                println!("{} ({})", user.username.bold(), user.email);
                println!("Name: {} {}", user.first_name, user.last_name);
                println!("Joined: {}", user.created_at);
            }
            Err(e) => fail("Failed to load account", e),
        },

        Commands::Index { page } => match client.index(page).await {
            Ok(posts) => {
                print_page_header(posts.page, posts.num_pages, posts.total);
                posts.items.iter().for_each(print_post_line);
            }
            Err(e) => fail("Failed to load feed", e),
        },

        Commands::Category { slug, page } => match client.category(&slug, page).await {
            Ok(listing) => {
                println!("{}", listing.category.title.bold());
                println!("{}", listing.category.description);
                print_page_header(listing.posts.page, listing.posts.num_pages, listing.posts.total);
                listing.posts.items.iter().for_each(print_post_line);
            }
            Err(e) => fail("Failed to load category", e),
        },

        Commands::Profile { username, page } => match client.profile(&username, page).await {
            Ok(listing) => {
                println!(
                    "{} {} {}",
                    listing.profile.username.bold(),
                    listing.profile.first_name,
                    listing.profile.last_name
                );
                print_page_header(listing.posts.page, listing.posts.num_pages, listing.posts.total);
                listing.posts.items.iter().for_each(print_post_line);
            }
            Err(e) => fail("Failed to load profile", e),
        },

        Commands::EditProfile {
            username,
            new_username,
            first_name,
            last_name,
            email,
        } => {
            let req = UpdateProfileRequest {
                username: new_username,
                first_name,
                last_name,
                email,
            };
            match client.update_profile(&username, req).await {
                Ok(user) => println!("{} {}", "Profile updated:".green(), user.username),
                Err(e) => fail("Failed to update profile", e),
            }
        }

        Commands::Post(command) => run_post(&client, command).await?,

        Commands::Comment(command) => run_comment(&client, command).await,
    }

    Ok(())
}

async fn run_post(client: &HttpClient, command: PostCommand) -> Result<()> {
    match command {
        PostCommand::Get { id, page } => match client.get_post(id, page).await {
            Ok(detail) => {
                print_post(&detail.post);
                println!();
                println!(
                    "Comments ({}), page {}/{}",
                    detail.comments.total,
                    detail.comments.page,
                    detail.comments.num_pages.max(1)
                );
                for comment in &detail.comments.items {
                    println!(
                        "  [{}] {} at {}: {}",
                        comment.id,
                        comment.author.username.bold(),
                        comment.created_at,
                        comment.text
                    );
                }
            }
            Err(e) => fail(&format!("Failed to load post #{}", id), e),
        },

        PostCommand::Create {
            title,
            text,
            pub_date,
            draft,
            category,
            location,
        } => {
            let req = CreatePostRequest {
                title,
                text,
                pub_date: pub_date.unwrap_or_else(Utc::now),
                is_published: !draft,
                category_id: category,
                location_id: location,
            };
            match client.create_post(req).await {
                Ok(post) => {
                    println!("{} #{}", "Post created".green(), post.id);
                    print_post(&post);
                }
                Err(e) => fail("Failed to create post", e),
            }
        }

        PostCommand::Update {
            id,
            title,
            text,
            pub_date,
            published,
            category,
            location,
        } => {
            let req = UpdatePostRequest {
                title,
                text,
                pub_date,
                is_published: published,
                category_id: category,
                location_id: location,
            };
            match client.update_post(id, req).await {
                Ok(post) => {
                    println!("{} #{}", "Post updated".green(), post.id);
                    print_post(&post);
                }
                Err(e) => fail(&format!("Failed to update post #{}", id), e),
            }
        }

        PostCommand::Delete { id } => match client.delete_post(id).await {
            Ok(()) => println!("{} #{}", "Post deleted".green(), id),
            Err(e) => fail(&format!("Failed to delete post #{}", id), e),
        },

        PostCommand::Image { id, file } => {
            let data =
                fs::read(&file).with_context(|| format!("Failed to read image {:?}", file))?;
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .context("Image path has no file name")?;

            match client.upload_image(id, filename, data).await {
                Ok(post) => println!(
                    "{} {}",
                    "Image stored at".green(),
                    post.image.unwrap_or_default()
                ),
                Err(e) => fail(&format!("Failed to upload image for post #{}", id), e),
            }
        }
    }

    Ok(())
}

async fn run_comment(client: &HttpClient, command: CommentCommand) {
    match command {
        CommentCommand::Add { post_id, text } => match client.add_comment(post_id, text).await {
            Ok(comment) => println!("{} #{}", "Comment added".green(), comment.id),
            Err(e) => fail("Failed to add comment", e),
        },

        CommentCommand::Edit {
            post_id,
            comment_id,
            text,
        } => match client.edit_comment(post_id, comment_id, text).await {
            Ok(comment) => println!("{} #{}", "Comment updated".green(), comment.id),
            Err(e) => fail("Failed to edit comment", e),
        },

        CommentCommand::Delete {
            post_id,
            comment_id,
        } => match client.delete_comment(post_id, comment_id).await {
            Ok(()) => println!("{} #{}", "Comment deleted".green(), comment_id),
            Err(e) => fail("Failed to delete comment", e),
        },
    }
}

fn fail(action: &str, error: BlogicumClientError) -> ! {
    eprintln!("{} {}", format!("{}:", action).red(), error);

    if error.is_unauthorized() {
        eprintln!("Please login first: blogicum-cli login --username <username> --password <password>");
    } else if error.is_denied() {
        eprintln!("Only the author can change this.");
    }

    std::process::exit(1);
}

fn print_page_header(page: i64, num_pages: i64, total: i64) {
    println!("Page {}/{} ({} posts)", page, num_pages.max(1), total);
    println!();
}

fn print_post_line(post: &Post) {
    let category = post
        .category
        .as_ref()
        .map(|c| c.slug.as_str())
        .unwrap_or("-");
    println!(
        "  [{}] {} by {} in {} ({} comments)",
        post.id,
        post.title.bold(),
        post.author.username,
        category,
        post.comment_count
    );
    println!("      {}", truncate(&post.text, 50));
}

fn print_post(post: &Post) {
    println!("{}", post.title.bold());
    println!("By {} on {}", post.author.username, post.pub_date);
    if !post.is_published {
        println!("{}", "Unpublished".yellow());
    }
    if let Some(location) = &post.location {
        println!("Location: {}", location.name);
    }
    if let Some(image) = &post.image {
        println!("Image: {}", image);
    }
    println!();
    println!("{}", post.text);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}
