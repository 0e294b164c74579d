//! Operations the official API does not offer, performed through the web
//! site's own dialogs: groups, imported services, pictures and imaginary
//! friends.

use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

use friendfeed_api::{Client, API_URI};

use crate::error::Error;
use crate::forms::{first_form, FormFields, Harvest};
use crate::web_auth::{WebAuth, WebResponse, ROOT_URI};

const IMAGINARY_PATH: &str = "/settings/imaginary?num=9999";

/// A service link found on a services page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceLink {
    /// Service kind, e.g. "twitter" or "blog".
    pub service: Option<String>,
    /// Present when the page lets the user edit the service.
    pub service_id: Option<String>,
    pub profile_url: Option<String>,
}

/// One of the authenticated user's imaginary friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImaginaryFriend {
    pub id: String,
    pub nickname: String,
    pub profile_url: String,
    pub services: Vec<ImaginaryService>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImaginaryService {
    /// Absent for the built-in "internal" service.
    pub service_id: Option<String>,
    pub name: String,
    pub profile_url: String,
}

/// An official API client logged in through the web site, which can also
/// call the site's internal endpoints.
pub struct WebClient {
    client: Client,
    auth: WebAuth,
}

impl WebClient {
    /// Logs in to friendfeed.com and validates the scraped remote key
    /// against the official API.
    pub async fn login(username: &str, password: &str) -> Result<Self, Error> {
        Self::login_at(API_URI, ROOT_URI, username, password).await
    }

    /// Like [`login`](Self::login) with custom endpoints. Used for testing
    /// with wiremock.
    pub async fn login_at(
        api_base: &str,
        web_root: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, Error> {
        let auth = WebAuth::login_at(web_root, username, password).await?;
        let client = Client::with_base_url(api_base)?;
        client.login(auth.clone()).await?;
        Ok(Self { client, auth })
    }

    /// The official API client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn auth(&self) -> &WebAuth {
        &self.auth
    }

    /// The validated nickname, falling back to the login name.
    pub fn nickname(&self) -> String {
        self.client
            .nickname()
            .unwrap_or_else(|| self.auth.username().to_string())
    }

    /// Lists the services of a user or group, by default the authenticated user.
    ///
    /// On the user's own page the links carry service ids; elsewhere they
    /// carry profile URLs.
    pub async fn get_services(&self, nickname: Option<&str>) -> Result<Vec<ServiceLink>, Error> {
        let nickname = nickname.map_or_else(|| self.nickname(), str::to_string);
        let services_uri = self.auth.root().join(&format!("{}/services", nickname))?;
        let page = self.auth.get_html(services_uri.as_str()).await?;
        Ok(parse_services(&page, &services_uri))
    }

    /// Creates a group and returns its id. `kind` is one of "group",
    /// "microblog" or "public".
    pub async fn create_group(
        &self,
        nickname: &str,
        name: &str,
        kind: &str,
    ) -> Result<String, Error> {
        let resp = self
            .auth
            .web_post(
                "/a/createfeed",
                [("nickname", nickname), ("name", name), ("type", kind)],
            )
            .await?;
        attr_of_first(&resp, "a.l_feedinvite", "sid", "group id")
    }

    /// Reads a group's profile dialog.
    pub async fn get_group(&self, id: &str) -> Result<FormFields, Error> {
        let resp = self
            .auth
            .web_post("/a/profiledialog", [("stream", id)])
            .await?;
        dialog_fields(&resp, id, Harvest::Full)
    }

    /// Edits a group's profile. Known fields are `nickname`, `name`,
    /// `description`, `access` ("private", "semipublic" or "public") and
    /// `anyoneinvite`.
    pub async fn edit_group<K, V>(
        &self,
        id: &str,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Result<WebResponse, Error>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = self.get_group(id).await?;
        params.update(fields);
        self.auth.web_post("/a/editprofile", params).await
    }

    /// Reads the settings dialog of one imported service.
    pub async fn get_service(&self, id: &str, service_id: &str) -> Result<FormFields, Error> {
        let resp = self
            .auth
            .web_post(
                "/a/servicedialog",
                [("serviceid", service_id), ("stream", id)],
            )
            .await?;
        dialog_fields(&resp, id, Harvest::Full)
    }

    /// Imports a service into the user, a group or an imaginary friend.
    /// `isstatus=on` shows entries as messages and `importcomment=on`
    /// imports descriptions as comments.
    pub async fn add_service(
        &self,
        id: &str,
        service: &str,
        options: FormFields,
    ) -> Result<WebResponse, Error> {
        let mut params = FormFields::new().with("stream", id).with("service", service);
        params.update(options);
        self.auth.web_post("/a/configureservice", params).await
    }

    pub async fn edit_service(
        &self,
        id: &str,
        service_id: &str,
        options: FormFields,
    ) -> Result<WebResponse, Error> {
        let mut params = self.get_service(id, service_id).await?;
        params.update(options);
        self.auth.web_post("/a/configureservice", params).await
    }

    /// Removes an imported service; `deleteentries=on` also deletes its entries.
    pub async fn remove_service(
        &self,
        id: &str,
        service_id: &str,
        service: &str,
        options: FormFields,
    ) -> Result<WebResponse, Error> {
        let mut params = FormFields::new()
            .with("stream", id)
            .with("service", service)
            .with("serviceid", service_id);
        params.update(options);
        self.auth.web_post("/a/removeservice", params).await
    }

    /// Asks the site to crawl an imported service now.
    pub async fn refresh_service(
        &self,
        id: &str,
        service_id: &str,
        options: FormFields,
    ) -> Result<WebResponse, Error> {
        let mut params = FormFields::new()
            .with("stream", id)
            .with("serviceid", service_id);
        params.update(options);
        self.auth.web_post("/a/crawlservice", params).await
    }

    /// Imports an RSS or Atom feed.
    pub async fn add_feed(
        &self,
        id: &str,
        url: &str,
        options: FormFields,
    ) -> Result<WebResponse, Error> {
        let mut params = FormFields::new().with("url", url);
        params.update(options);
        self.add_service(id, "feed", params).await
    }

    /// Imports a blog. `multiauth=on` marks a blog with several authors and
    /// `author` limits entries to one of them.
    pub async fn add_blog(
        &self,
        id: &str,
        url: &str,
        options: FormFields,
    ) -> Result<WebResponse, Error> {
        let mut params = FormFields::new().with("url", url);
        params.update(options);
        self.add_service(id, "blog", params).await
    }

    pub async fn add_twitter(
        &self,
        id: &str,
        twitter_name: &str,
        options: FormFields,
    ) -> Result<WebResponse, Error> {
        let mut params = FormFields::new().with("username", twitter_name);
        params.update(options);
        self.add_service(id, "twitter", params).await
    }

    /// Uploads a new picture for the user, a group or an imaginary friend.
    pub async fn change_picture(
        &self,
        id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<WebResponse, Error> {
        self.auth
            .web_upload("/a/changepicture", [("stream", id)], "picture", file_name, bytes)
            .await
    }

    pub async fn unsubscribe_from(&self, id: &str) -> Result<WebResponse, Error> {
        self.auth.web_post("/a/unsubscribe", [("stream", id)]).await
    }

    /// Creates an imaginary friend and returns its id.
    pub async fn create_imaginary_friend(&self, nickname: &str) -> Result<String, Error> {
        let resp = self
            .auth
            .web_post("/a/createimaginary", [("name", nickname)])
            .await?;
        attr_of_first(&resp, "#serviceseditor", "streamid", "imaginary friend id")
    }

    pub async fn rename_imaginary_friend(
        &self,
        id: &str,
        nickname: &str,
    ) -> Result<WebResponse, Error> {
        let resp = self
            .auth
            .web_post("/a/profiledialog", [("stream", id)])
            .await?;
        let mut params = dialog_fields(&resp, id, Harvest::TextOnly)?;
        params.set("name", nickname);
        self.auth.web_post("/a/editprofile", params).await
    }

    pub async fn remove_imaginary_friend(&self, id: &str) -> Result<WebResponse, Error> {
        self.auth.web_post("/a/userunsubscribe", [("user", id)]).await
    }

    /// Fetches every imaginary friend of the authenticated user.
    pub async fn get_imaginary_friends(&self) -> Result<Vec<ImaginaryFriend>, Error> {
        let page = self.auth.get_html(IMAGINARY_PATH).await?;
        let ids = {
            let document = Html::parse_document(&page);
            let selector = Selector::parse("div.name a.l_person").expect("invalid selector");
            document
                .select(&selector)
                .filter_map(|a| a.value().attr("uid").map(str::to_string))
                .collect::<Vec<_>>()
        };
        tracing::debug!("Found {} imaginary friends", ids.len());

        let mut friends = Vec::with_capacity(ids.len());
        for id in ids {
            friends.push(self.get_imaginary_friend(&id).await?);
        }
        Ok(friends)
    }

    /// Fetches one imaginary friend's profile and services.
    ///
    /// Services whose link lacks an id cost one more page load each.
    pub async fn get_imaginary_friend(&self, id: &str) -> Result<ImaginaryFriend, Error> {
        let profile_uri = self.auth.root().join(&format!("/users/{}", id))?;
        let page = self.auth.get_html(profile_uri.as_str()).await?;
        let (nickname, links) = parse_imaginary_profile(&page, &profile_uri);

        let mut services = Vec::with_capacity(links.len());
        for link in links {
            let service_id = match (link.name.as_str(), link.service_id) {
                ("internal", _) => None,
                (_, Some(service_id)) => Some(service_id),
                (name, None) => {
                    let mut service_uri = profile_uri.clone();
                    service_uri.query_pairs_mut().append_pair("service", name);
                    let page = self.auth.get_html(service_uri.as_str()).await?;
                    first_attr(&page, "a.l_refreshfeed", "serviceid")
                }
            };
            services.push(ImaginaryService {
                service_id,
                name: link.name,
                profile_url: link.profile_url,
            });
        }

        Ok(ImaginaryFriend {
            id: id.to_string(),
            nickname,
            profile_url: profile_uri.to_string(),
            services,
        })
    }
}

impl std::fmt::Debug for WebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebClient")
            .field("client", &self.client)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Harvests the first form of a dialog, seeded with the stream id.
fn dialog_fields(resp: &WebResponse, id: &str, harvest: Harvest) -> Result<FormFields, Error> {
    let document = resp
        .document()
        .ok_or_else(|| Error::FieldNotFound("dialog HTML".into()))?;
    let form = first_form(&document, harvest)
        .ok_or_else(|| Error::FieldNotFound("dialog form".into()))?;
    let mut fields = FormFields::new().with("stream", id);
    fields.update(form);
    Ok(fields)
}

fn attr_of_first(
    resp: &WebResponse,
    selector: &str,
    attr: &str,
    what: &str,
) -> Result<String, Error> {
    resp.document()
        .and_then(|document| select_attr(&document, selector, attr))
        .ok_or_else(|| {
            tracing::error!("No {} in response", what);
            Error::FieldNotFound(what.to_string())
        })
}

fn first_attr(page: &str, selector: &str, attr: &str) -> Option<String> {
    select_attr(&Html::parse_document(page), selector, attr)
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .find_map(|element| element.value().attr(attr).filter(|value| !value.is_empty()))
        .map(str::to_string)
}

fn parse_services(page: &str, services_uri: &Url) -> Vec<ServiceLink> {
    let document = Html::parse_document(page);
    let editable = Selector::parse(".active ul.servicelist > li > a").expect("invalid selector");
    let public = Selector::parse("ul.servicelist > li > a").expect("invalid selector");

    let links: Vec<_> = document.select(&editable).collect();
    if !links.is_empty() {
        return links
            .into_iter()
            .map(|a| ServiceLink {
                service: service_class(a.value().classes(), &["l_editservice", "service"]),
                service_id: a.value().attr("serviceid").map(str::to_string),
                profile_url: None,
            })
            .collect();
    }
    document
        .select(&public)
        .map(|a| ServiceLink {
            service: service_class(a.value().classes(), &["service"]),
            service_id: None,
            profile_url: a
                .value()
                .attr("href")
                .and_then(|href| services_uri.join(href).ok())
                .map(|url| url.to_string()),
        })
        .collect()
}

/// The service kind is the one class that is not markup bookkeeping.
fn service_class<'a>(mut classes: impl Iterator<Item = &'a str>, skip: &[&str]) -> Option<String> {
    classes.find(|c| !skip.contains(c)).map(str::to_string)
}

struct ServiceFilter {
    name: String,
    service_id: Option<String>,
    profile_url: String,
}

fn parse_imaginary_profile(page: &str, profile_uri: &Url) -> (String, Vec<ServiceFilter>) {
    let document = Html::parse_document(page);
    let heading = Selector::parse("h1 a").expect("invalid selector");
    let filters = Selector::parse("div.servicefilter a.l_filterservice").expect("invalid selector");

    let nickname = document
        .select(&heading)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let links = document
        .select(&filters)
        .map(|a| {
            let element = a.value();
            ServiceFilter {
                name: element.attr("servicename").unwrap_or_default().to_string(),
                service_id: element
                    .attr("serviceid")
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
                profile_url: element
                    .attr("href")
                    .and_then(|href| profile_uri.join(href).ok())
                    .map(|url| url.to_string())
                    .unwrap_or_default(),
            }
        })
        .collect();
    (nickname, links)
}
