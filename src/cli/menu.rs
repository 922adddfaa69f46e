use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::error;

use crate::cli::prompt::Prompt;
use crate::error::Result;
use crate::models::vacancy::{Vacancy, FIELD_CITY, FIELD_SALARY};
use crate::services::search_service::{SearchService, VacancySource};
use crate::services::storage_service::{Criteria, VacancyStore};
use crate::services::vacancy_manager::VacancyManager;

const MENU: &str = "\nChoose an action:\n\
 (1) Fetch and add vacancies\n\
 (2) Query stored vacancies\n\
 (3) Sort stored vacancies\n\
 (4) Top N stored vacancies\n\
 (5) Delete vacancies\n\
 (0) Exit";

enum Flow {
    Continue,
    Exit,
}

pub struct Menu<'a, S, R, W> {
    search: &'a SearchService<S>,
    store: &'a VacancyStore,
    prompt: Prompt<R, W>,
}

impl<'a, S, R, W> Menu<'a, S, R, W>
where
    S: VacancySource + Clone,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(search: &'a SearchService<S>, store: &'a VacancyStore, prompt: Prompt<R, W>) -> Self {
        Self {
            search,
            store,
            prompt,
        }
    }

    /// Runs until the user exits or input ends. Action failures are reported
    /// and the loop continues; only prompt I/O failures end it early.
    pub async fn run(mut self) -> Result<Prompt<R, W>> {
        loop {
            self.prompt.say(MENU).await?;
            let Some(choice) = self.prompt.ask(">").await? else {
                break;
            };

            let outcome = match choice.as_str() {
                "1" => self.fetch_and_add().await,
                "2" => self.query().await,
                "3" => self.sort().await,
                "4" => self.top_n().await,
                "5" => self.delete().await,
                "0" => Ok(Flow::Exit),
                _ => {
                    self.prompt.say("Unknown action, try again.").await?;
                    Ok(Flow::Continue)
                }
            };

            match outcome {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(err) => {
                    error!(error = %err, "Menu action failed");
                    self.prompt.say(format!("Error: {err}")).await?;
                }
            }
        }
        Ok(self.prompt)
    }

    async fn print_all(&mut self, heading: &str, vacancies: &[Vacancy]) -> Result<()> {
        if vacancies.is_empty() {
            return self.prompt.say("No vacancies found.").await;
        }
        self.prompt.say(heading).await?;
        for vacancy in vacancies {
            self.prompt.say(format!("{vacancy}\n")).await?;
        }
        Ok(())
    }

    async fn fetch_and_add(&mut self) -> Result<Flow> {
        let Some(query) = self.prompt.ask("Vacancy title:").await? else {
            return Ok(Flow::Exit);
        };
        let Some(keyword) = self.prompt.ask("Keyword to filter descriptions by:").await? else {
            return Ok(Flow::Exit);
        };
        let Some(salary) = self.prompt.ask_number::<i64>("Minimum salary:").await? else {
            return Ok(Flow::Exit);
        };
        let Some(period) = self.prompt.ask_number::<i64>("Period in days:").await? else {
            return Ok(Flow::Exit);
        };

        let mut manager = VacancyManager::new(self.search.clone());
        manager.fetch_vacancies(&query, salary, period).await?;
        let matched: Vec<Vacancy> = manager
            .filter_by_keyword(&keyword)
            .into_iter()
            .cloned()
            .collect();

        if matched.is_empty() {
            self.prompt
                .say(format!("No vacancies mention '{keyword}' in the description."))
                .await?;
            return Ok(Flow::Continue);
        }

        self.print_all("Fetched vacancies:", &matched).await?;
        let added = self.store.add_many(&matched).await?;
        self.prompt
            .say(format!("{added} vacancies added to the store."))
            .await?;

        let Some(top) = self
            .prompt
            .ask_optional_number::<usize>("Show top N fetched by salary (blank to skip):")
            .await?
        else {
            return Ok(Flow::Exit);
        };
        if let Some(n) = top {
            manager.sort_by_salary();
            let best = manager.top_n(n)?.to_vec();
            self.print_all("Top fetched vacancies:", &best).await?;
        }
        Ok(Flow::Continue)
    }

    async fn query(&mut self) -> Result<Flow> {
        let Some(city) = self.prompt.ask("City (blank for any):").await? else {
            return Ok(Flow::Exit);
        };
        let Some(salary) = self
            .prompt
            .ask_optional_number::<u64>("Exact salary (blank for any):")
            .await?
        else {
            return Ok(Flow::Exit);
        };

        let mut criteria = Criteria::new();
        if !city.is_empty() {
            criteria = criteria.with(FIELD_CITY, city);
        }
        if let Some(salary) = salary {
            criteria = criteria.with(FIELD_SALARY, salary);
        }

        let found = self.store.query(&criteria).await?;
        self.print_all("Matching vacancies:", &found).await?;
        Ok(Flow::Continue)
    }

    async fn sort(&mut self) -> Result<Flow> {
        let Some(order) = self.prompt.ask("Order (asc/desc):").await? else {
            return Ok(Flow::Exit);
        };
        let descending = match order.to_lowercase().as_str() {
            "asc" => false,
            "desc" => true,
            _ => {
                self.prompt.say("Please enter 'asc' or 'desc'.").await?;
                return Ok(Flow::Continue);
            }
        };

        let sorted = self.store.sorted_by_salary(descending).await?;
        self.print_all("Sorted vacancies:", &sorted).await?;
        Ok(Flow::Continue)
    }

    async fn top_n(&mut self) -> Result<Flow> {
        let Some(n) = self.prompt.ask_number::<usize>("How many:").await? else {
            return Ok(Flow::Exit);
        };
        let top = self.store.top_n(n).await?;
        self.print_all("Top vacancies:", &top).await?;
        Ok(Flow::Continue)
    }

    async fn delete(&mut self) -> Result<Flow> {
        let Some(by) = self
            .prompt
            .ask("Delete by (1) city (2) salary (3) everything:")
            .await?
        else {
            return Ok(Flow::Exit);
        };

        let criteria = match by.as_str() {
            "1" => {
                let Some(city) = self.prompt.ask("City:").await? else {
                    return Ok(Flow::Exit);
                };
                Criteria::new().with(FIELD_CITY, city)
            }
            "2" => {
                let Some(salary) = self.prompt.ask_number::<u64>("Salary:").await? else {
                    return Ok(Flow::Exit);
                };
                Criteria::new().with(FIELD_SALARY, salary)
            }
            "3" => Criteria::new(),
            _ => {
                self.prompt.say("Unknown option, nothing deleted.").await?;
                return Ok(Flow::Continue);
            }
        };

        let kept = self.store.delete(&criteria).await?;
        self.prompt
            .say(format!("{} vacancies left in the store.", kept.len()))
            .await?;
        Ok(Flow::Continue)
    }
}
